//! Recursive structural validator

use serde_json::Value;
use tracing::debug;

use super::issue::ValidationIssue;
use crate::config::NumericPolicy;
use crate::schema::path::{child_path, display_path, index_path};
use crate::schema::{PrimitiveType, SchemaNode};
use crate::script::value::string_to_number;

/// Runtime type name of a JSON value
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Checks produced values against a schema shape
///
/// Checking is fail-soft: every field is visited and all discrepancies are
/// collected. A structural break (an object or array was expected but
/// something else was found) skips only the subtree below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    policy: NumericPolicy,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: NumericPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> NumericPolicy {
        self.policy
    }

    pub fn validate(&self, value: &Value, schema: &SchemaNode) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check(value, schema, "", &mut issues);
        debug!(
            issues = issues.len(),
            policy = %self.policy,
            "Validated value against schema"
        );
        issues
    }

    fn check(
        &self,
        value: &Value,
        schema: &SchemaNode,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        match schema {
            SchemaNode::Primitive(expected) => {
                if let Some(issue) = self.check_primitive(value, *expected, path) {
                    issues.push(issue);
                }
            }
            SchemaNode::Object(fields) => {
                let Value::Object(map) = value else {
                    issues.push(ValidationIssue::ExpectedObject {
                        path: display_path(path).to_string(),
                        actual: json_type_name(value).to_string(),
                    });
                    return;
                };
                for (key, child) in fields {
                    let child_at = child_path(path, key);
                    match map.get(key) {
                        Some(v) => self.check(v, child, &child_at, issues),
                        None => issues.push(ValidationIssue::MissingField { path: child_at }),
                    }
                }
            }
            SchemaNode::Array(element) => {
                let Value::Array(items) = value else {
                    issues.push(ValidationIssue::ExpectedArray {
                        path: display_path(path).to_string(),
                        actual: json_type_name(value).to_string(),
                    });
                    return;
                };
                for (i, item) in items.iter().enumerate() {
                    self.check(item, element, &index_path(path, i), issues);
                }
            }
        }
    }

    fn check_primitive(
        &self,
        value: &Value,
        expected: PrimitiveType,
        path: &str,
    ) -> Option<ValidationIssue> {
        let actual = json_type_name(value);
        if !expected.is_numeric() {
            if actual.eq_ignore_ascii_case(expected.as_str()) {
                return None;
            }
            return Some(self.mismatch(path, expected, actual));
        }

        let Some(number) = self.numeric_value(value) else {
            return Some(self.mismatch(path, expected, actual));
        };
        if expected == PrimitiveType::Integer && number.fract() != 0.0 {
            return Some(ValidationIssue::NotInteger {
                path: display_path(path).to_string(),
                value: value.to_string(),
            });
        }
        None
    }

    /// Numeric reading of a value under the configured policy
    fn numeric_value(&self, value: &Value) -> Option<f64> {
        match (value, self.policy) {
            (Value::Number(n), _) => n.as_f64(),
            (Value::String(s), NumericPolicy::Loose) if !s.trim().is_empty() => {
                let n = string_to_number(s);
                n.is_finite().then_some(n)
            }
            _ => None,
        }
    }

    fn mismatch(&self, path: &str, expected: PrimitiveType, actual: &str) -> ValidationIssue {
        ValidationIssue::TypeMismatch {
            path: display_path(path).to_string(),
            expected: expected.as_str().to_string(),
            actual: actual.to_string(),
        }
    }
}
