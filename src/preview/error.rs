//! Preview error types

use thiserror::Error;

use crate::script::ScriptError;
use crate::validation::ValidationIssue;

/// Reasons a preview produced no result
///
/// A conversion program is parsed as a whole before anything runs, so a
/// syntax error anywhere in it, including inside a saved override body,
/// is reported as [`PreviewError::MalformedProgram`]. Failures raised once
/// evaluation has started (thrown errors, type and reference errors,
/// exhausted limits, out-of-range lengths) are [`PreviewError::Execution`].
/// Both reach callers of [`MappingSession::run_preview`] as the `{error}`
/// envelope, carrying the `Display` text of the variant.
///
/// [`MappingSession::run_preview`]: crate::session::MappingSession::run_preview
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreviewError {
    /// Target fields without any mapped source; nothing was executed
    #[error("field(s) not mapped: {}", .fields.join(", "))]
    Unmapped { fields: Vec<String> },

    /// The program, with every override spliced in, does not parse
    #[error("Malformed conversion program: {0}")]
    MalformedProgram(#[source] ScriptError),

    /// The program parsed but failed while running
    #[error("{0}")]
    Execution(#[source] ScriptError),

    /// The produced value does not match the target schema
    #[error("Output schema validation failed: {}", join_issues(.issues))]
    Validation { issues: Vec<ValidationIssue> },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl PreviewError {
    /// Whether the program was run at all
    pub fn was_executed(&self) -> bool {
        !matches!(
            self,
            PreviewError::Unmapped { .. } | PreviewError::MalformedProgram(_)
        )
    }
}

/// Result type for preview operations
pub type PreviewResult<T> = Result<T, PreviewError>;
