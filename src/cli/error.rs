//! CLI error types

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::preview::PreviewError;
use crate::schema::SchemaError;

/// Errors surfaced by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read {}: {}", .0.display(), .1)]
    FileReadError(PathBuf, String),

    #[error("Failed to parse {}: {}", .0.display(), .1)]
    ParseError(PathBuf, String),

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid mapping: {0}")]
    MappingError(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Preview failed: {0}")]
    Preview(#[from] PreviewError),

    #[error("Validation found {} issue(s):\n{}", .0.len(), .0.join("\n"))]
    ValidationFailed(Vec<String>),
}
