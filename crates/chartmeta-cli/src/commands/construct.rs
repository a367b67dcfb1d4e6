//! Construct command - build nested values from flat parameters

use chartmeta_core::{CommonConfigValue, MetaInfoParams};
use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde_json::Value as JsonValue;
use std::path::Path;

use super::{load_meta_info, print_document};
use crate::error::CliError;

pub fn run(metainfo: &Path, params_path: &Path, user_input: bool, json: bool) -> Result<()> {
    let meta_info = load_meta_info(metainfo)?;
    let mut params = load_params(params_path)?;

    if user_input {
        encode_user_input(&mut params)?;
    }

    let values = params.build_config_values(&meta_info).map_err(|e| {
        CliError::conversion_with_help(
            e.to_string(),
            "Two map keys may overlap, or a value may not match its declared type",
        )
    })?;

    eprintln!(
        "{} Built values from {} param(s) and {} role(s)",
        style("✓").green(),
        params.params.len(),
        params.roles.len()
    );

    print_document(&values, json)
}

/// Parameters file, JSON or YAML
fn load_params(path: &Path) -> Result<MetaInfoParams> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read params from {}", path.display()))?;

    let doc: JsonValue = serde_yaml::from_str(&content)
        .into_diagnostic()
        .wrap_err("Params file is not valid YAML or JSON")?;

    serde_json::from_value(doc)
        .into_diagnostic()
        .wrap_err("Params file does not match the params format")
}

/// Re-encode plain text values according to each param's declared type
fn encode_user_input(params: &mut MetaInfoParams) -> Result<()> {
    let others = params
        .roles
        .iter_mut()
        .filter_map(|r| r.base.as_mut())
        .flat_map(|b| b.others.iter_mut());

    for param in params.params.iter_mut().chain(others) {
        let Some(kind) = param.kind else {
            continue;
        };
        if param.value.is_empty() {
            continue;
        }
        *param = CommonConfigValue::from_input(&param.name, kind, &param.value)
            .map_err(CliError::from)?;
    }

    Ok(())
}
