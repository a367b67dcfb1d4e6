//! Merge command - deep merge values files

use console::style;
use miette::Result;
use std::path::{Path, PathBuf};

use chartmeta_core::{Values, parse_set_values};

use super::print_document;
use crate::error::CliError;

pub fn run(
    base: &Path,
    overlays: &[PathBuf],
    set: &[String],
    delete_null: bool,
    json: bool,
) -> Result<()> {
    let mut values = Values::from_file(base).map_err(CliError::from)?;

    for overlay in overlays {
        let overlay_values = Values::from_file(overlay).map_err(CliError::from)?;
        values
            .merge_with(&overlay_values, delete_null)
            .map_err(CliError::from)?;
        eprintln!(
            "{} Merged {}",
            style("→").blue(),
            overlay.display()
        );
    }

    if !set.is_empty() {
        let overrides = parse_set_values(set).map_err(CliError::from)?;
        values
            .merge_with(&overrides, delete_null)
            .map_err(CliError::from)?;
    }

    print_document(values.inner(), json)
}
