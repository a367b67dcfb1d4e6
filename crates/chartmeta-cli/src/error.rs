//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use chartmeta_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Meta info could not be loaded
    #[error("Meta info error: {message}")]
    #[diagnostic(code(chartmeta::cli::metainfo))]
    MetaInfo {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Parameters could not be turned into values
    #[error("Conversion failed: {message}")]
    #[diagnostic(code(chartmeta::cli::conversion))]
    Conversion {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Linting failed with errors
    #[error("Linting failed with {errors} error(s) and {warnings} warning(s)")]
    #[diagnostic(code(chartmeta::cli::lint))]
    LintFailed { errors: usize, warnings: usize },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartmeta::cli::io))]
    Io { message: String },

    /// Any other core failure
    #[error("{message}")]
    #[diagnostic(code(chartmeta::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::MetaInfo { .. } => exit_codes::METAINFO_ERROR,
            CliError::Conversion { .. } => exit_codes::CONVERSION_ERROR,
            CliError::LintFailed { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a conversion error with help text
    pub fn conversion_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a lint failure error
    pub fn lint_failed(errors: usize, warnings: usize) -> Self {
        Self::LintFailed { errors, warnings }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            CoreError::InvalidMetaInfo { message } => CliError::MetaInfo {
                message,
                help: Some("Check field names and types against the meta info schema".to_string()),
            },
            e @ (CoreError::PathConflict { .. }
            | CoreError::InvalidPath { .. }
            | CoreError::InvalidParam { .. }
            | CoreError::InvalidQuantity { .. }) => CliError::Conversion {
                message: e.to_string(),
                help: None,
            },
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

/// Exit code for a report, falling back to a general error
pub fn exit_code_for(report: &miette::Report) -> i32 {
    report
        .downcast_ref::<CliError>()
        .map_or(exit_codes::ERROR, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let err = CliError::from(CoreError::InvalidMetaInfo {
            message: "unknown field `paramz`".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::METAINFO_ERROR);

        let err = CliError::from(CoreError::PathConflict {
            path: "a.b".to_string(),
            segment: "a".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::CONVERSION_ERROR);

        let err = CliError::from(CoreError::Io(std::io::Error::other("gone")));
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);

        let err = CliError::from(CoreError::MergeDepthExceeded { depth: 64 });
        assert_eq!(err.exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_exit_code_for_report() {
        let report = miette::Report::new(CliError::lint_failed(2, 0));
        assert_eq!(exit_code_for(&report), exit_codes::VALIDATION_ERROR);

        let report = miette::miette!("plain failure");
        assert_eq!(exit_code_for(&report), exit_codes::ERROR);
    }
}
