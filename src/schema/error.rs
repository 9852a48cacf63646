//! Error types for schema parsing

use thiserror::Error;

/// Errors that can occur while reading a schema tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A leaf carried a type tag outside the supported set
    #[error("Unknown type '{tag}' at {path}")]
    UnknownType { path: String, tag: String },

    /// An array node did not have exactly one exemplar element
    #[error("Array at {path} must have exactly one element describing its items, found {found}")]
    InvalidArray { path: String, found: usize },

    /// A node was neither a string, an array nor an object
    #[error("Invalid schema node at {path}: {reason}")]
    InvalidNode { path: String, reason: String },

    /// Schema text could not be parsed
    #[error("Failed to parse schema: {0}")]
    ParseError(String),
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
