//! Output validator for produced values
//!
//! ```rust
//! use api_mapping_sdk::schema::SchemaNode;
//! use api_mapping_sdk::validation::validate;
//! use serde_json::json;
//!
//! let schema = SchemaNode::from_value(&json!({"elements": [{"id": "string"}]})).unwrap();
//! let issues = validate(&json!({"elements": [{"id": 1}, {"id": "ok"}]}), &schema);
//! assert_eq!(issues, vec!["elements[0].id: type mismatch, expected string, got number"]);
//! ```

mod issue;
mod validator;

pub use issue::ValidationIssue;
pub use validator::{Validator, json_type_name};

use serde_json::Value;

use crate::schema::SchemaNode;

/// Check `value` against `schema` with loose numeric matching
///
/// Returns one message per discrepancy; an empty list means valid.
pub fn validate(value: &Value, schema: &SchemaNode) -> Vec<String> {
    validate_issues(value, schema)
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Like [`validate`], returning typed issues
pub fn validate_issues(value: &Value, schema: &SchemaNode) -> Vec<ValidationIssue> {
    Validator::new().validate(value, schema)
}
