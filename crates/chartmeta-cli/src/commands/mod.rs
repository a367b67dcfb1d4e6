//! CLI commands

pub mod construct;
pub mod defaults;
pub mod extract;
pub mod lint;
pub mod merge;

use chartmeta_core::{ChartMetaInfo, Values, parse_set_values};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// Load meta info, YAML or JSON by extension
pub(crate) fn load_meta_info(path: &Path) -> Result<ChartMetaInfo> {
    let meta_info = ChartMetaInfo::from_file(path)
        .map_err(CliError::from)
        .wrap_err_with(|| format!("Failed to load meta info from {}", path.display()))?;
    tracing::debug!(
        "loaded meta info {} ({} params, {} roles)",
        path.display(),
        meta_info.params.len(),
        meta_info.roles.len()
    );
    Ok(meta_info)
}

/// Merge values files in order, then `--set` overrides
pub(crate) fn load_values(files: &[PathBuf], set: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for file in files {
        let overlay = Values::from_file(file)
            .map_err(CliError::from)
            .wrap_err_with(|| format!("Failed to load values from {}", file.display()))?;
        values.merge(&overlay).map_err(CliError::from)?;
        tracing::debug!("merged values from {}", file.display());
    }

    if !set.is_empty() {
        let overrides = parse_set_values(set).map_err(CliError::from)?;
        values.merge(&overrides).map_err(CliError::from)?;
    }

    Ok(values)
}

/// Print a document to stdout as YAML, or pretty JSON with `json`
pub(crate) fn print_document<T: Serialize>(doc: &T, json: bool) -> Result<()> {
    let output = if json {
        serde_json::to_string_pretty(doc).into_diagnostic()?
    } else {
        serde_yaml::to_string(doc).into_diagnostic()?
    };
    println!("{}", output.trim_end());
    Ok(())
}
