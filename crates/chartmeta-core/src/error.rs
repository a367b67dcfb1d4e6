//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Cannot set '{path}': '{segment}' is not an object")]
    PathConflict { path: String, segment: String },

    #[error("Values merge exceeded maximum depth of {depth}")]
    MergeDepthExceeded { depth: usize },

    #[error("Invalid quantity '{input}': {message}")]
    InvalidQuantity { input: String, message: String },

    #[error("Invalid value for parameter '{name}' of type {kind}: {message}")]
    InvalidParam {
        name: String,
        kind: String,
        message: String,
    },

    #[error("Invalid meta info: {message}")]
    InvalidMetaInfo { message: String },

    #[error("Values merge error: {message}")]
    ValuesMerge { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
