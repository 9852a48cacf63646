//! Discrepancies found while checking a value against a schema

use serde::Serialize;
use thiserror::Error;

/// One structural discrepancy between a produced value and a schema
///
/// Paths use dotted keys and bracketed indices (`elements[0].id`); a
/// mismatch on the value itself reads as `root`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// A declared field is absent
    #[error("missing field: {path}")]
    MissingField { path: String },

    /// A primitive value has the wrong type
    #[error("{path}: type mismatch, expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A value declared `integer` has a fractional part
    #[error("{path}: expected integer, got non-integer value {value}")]
    NotInteger { path: String, value: String },

    /// An object was declared but something else was found
    #[error("{path}: expected object, got {actual}")]
    ExpectedObject { path: String, actual: String },

    /// An array was declared but something else was found
    #[error("{path}: expected array, got {actual}")]
    ExpectedArray { path: String, actual: String },
}

impl ValidationIssue {
    pub fn path(&self) -> &str {
        match self {
            ValidationIssue::MissingField { path }
            | ValidationIssue::TypeMismatch { path, .. }
            | ValidationIssue::NotInteger { path, .. }
            | ValidationIssue::ExpectedObject { path, .. }
            | ValidationIssue::ExpectedArray { path, .. } => path,
        }
    }

    /// Whether this issue stopped checking of the subtree below it
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ValidationIssue::ExpectedObject { .. } | ValidationIssue::ExpectedArray { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let issue = ValidationIssue::MissingField {
            path: "user.name".to_string(),
        };
        assert_eq!(issue.to_string(), "missing field: user.name");

        let issue = ValidationIssue::TypeMismatch {
            path: "elements[0].id".to_string(),
            expected: "string".to_string(),
            actual: "number".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "elements[0].id: type mismatch, expected string, got number"
        );
        assert_eq!(issue.path(), "elements[0].id");
        assert!(!issue.is_structural());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let issue = ValidationIssue::ExpectedArray {
            path: "tags".to_string(),
            actual: "string".to_string(),
        };
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["kind"], "expected_array");
        assert_eq!(value["path"], "tags");
        assert!(issue.is_structural());
    }
}
