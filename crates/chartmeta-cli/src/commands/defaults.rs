//! Defaults command - refresh meta info defaults from values

use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_meta_info, load_values, print_document};

pub fn run(metainfo: &Path, values_files: &[PathBuf], json: bool) -> Result<()> {
    let mut meta_info = load_meta_info(metainfo)?;
    let values = load_values(values_files, &[])?;

    meta_info.build_default_value(values.inner());

    print_document(&meta_info, json)
}
