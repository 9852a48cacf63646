//! Error types for parsing and evaluating scripts

use thiserror::Error;

/// Errors raised while lexing, parsing or running a script
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The source text is not valid in the supported subset
    #[error("SyntaxError at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// An unbound name was read
    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    /// An operation was applied to a value of the wrong kind
    #[error("TypeError: {0}")]
    Type(String),

    /// The script executed a `throw`
    #[error("{0}")]
    Thrown(String),

    /// The evaluation step budget ran out
    #[error("Evaluation exceeded {0} steps")]
    StepLimitExceeded(usize),

    /// Calls nested deeper than allowed
    #[error("Maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    /// Statements and expressions nested deeper than allowed while running
    #[error("Maximum nesting depth of {0} exceeded")]
    NestingTooDeep(usize),

    /// A value could not be converted to JSON
    #[error("Cannot convert value to JSON: {0}")]
    Conversion(String),
}

impl ScriptError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        ScriptError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        ScriptError::Type(message.into())
    }

    pub(crate) fn invalid_string_length() -> Self {
        ScriptError::Thrown("RangeError: Invalid string length".to_string())
    }

    pub(crate) fn invalid_array_length() -> Self {
        ScriptError::Thrown("RangeError: Invalid array length".to_string())
    }

    /// Whether this is a parse-time failure
    pub fn is_syntax(&self) -> bool {
        matches!(self, ScriptError::Syntax { .. })
    }
}

/// Result type for script operations
pub type ScriptResult<T> = Result<T, ScriptError>;
