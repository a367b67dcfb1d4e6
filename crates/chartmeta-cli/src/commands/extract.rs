//! Extract command - read flat parameters out of values

use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_meta_info, load_values, print_document};

pub fn run(metainfo: &Path, values_files: &[PathBuf], set: &[String]) -> Result<()> {
    let meta_info = load_meta_info(metainfo)?;
    let values = load_values(values_files, set)?;

    let params = meta_info.build_params(values.inner());
    tracing::debug!(
        "extracted {} params and {} roles",
        params.params.len(),
        params.roles.len()
    );

    print_document(&params, true)
}
