//! Recursive schema tree for API response and UI requirement shapes

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{SchemaError, SchemaResult};
use super::path::{child_path, display_path, index_path};

/// Primitive leaf type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Float,
    Boolean,
    /// Opaque object whose members are not described
    Object,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Float => "float",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Object => "object",
        }
    }

    /// `number`, `float` and `integer` share loose numeric matching
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Number | PrimitiveType::Float | PrimitiveType::Integer
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(PrimitiveType::String),
            "number" => Ok(PrimitiveType::Number),
            "integer" => Ok(PrimitiveType::Integer),
            "float" => Ok(PrimitiveType::Float),
            "boolean" => Ok(PrimitiveType::Boolean),
            "object" => Ok(PrimitiveType::Object),
            _ => Err(format!("Unknown primitive type: {}", s)),
        }
    }
}

/// A node of a schema tree
///
/// Schemas are written as plain JSON: a string leaf is a type tag, a
/// one-element array describes a homogeneous list, and an object maps
/// field names to child nodes. Field order is insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum SchemaNode {
    Primitive(PrimitiveType),
    /// Array of elements that all share the exemplar shape
    Array(Box<SchemaNode>),
    Object(IndexMap<String, SchemaNode>),
}

impl SchemaNode {
    /// An object node with no fields
    pub fn empty_object() -> Self {
        SchemaNode::Object(IndexMap::new())
    }

    /// Parse a schema tree from its JSON form
    pub fn from_value(value: &Value) -> SchemaResult<Self> {
        Self::parse_at(value, "")
    }

    /// Parse a schema tree from JSON text
    pub fn from_json_str(text: &str) -> SchemaResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SchemaError::ParseError(e.to_string()))?;
        Self::from_value(&value)
    }

    fn parse_at(value: &Value, path: &str) -> SchemaResult<Self> {
        match value {
            Value::String(tag) => tag
                .parse::<PrimitiveType>()
                .map(SchemaNode::Primitive)
                .map_err(|_| SchemaError::UnknownType {
                    path: display_path(path).to_string(),
                    tag: tag.clone(),
                }),
            Value::Array(items) => {
                if items.len() != 1 {
                    return Err(SchemaError::InvalidArray {
                        path: display_path(path).to_string(),
                        found: items.len(),
                    });
                }
                let element = Self::parse_at(&items[0], &index_path(path, 0))?;
                Ok(SchemaNode::Array(Box::new(element)))
            }
            Value::Object(fields) => {
                let mut children = IndexMap::with_capacity(fields.len());
                for (key, child) in fields {
                    children.insert(key.clone(), Self::parse_at(child, &child_path(path, key))?);
                }
                Ok(SchemaNode::Object(children))
            }
            other => Err(SchemaError::InvalidNode {
                path: display_path(path).to_string(),
                reason: format!("expected a type name, array or object, got {}", other),
            }),
        }
    }

    /// Render the schema back to its JSON form
    pub fn to_value(&self) -> Value {
        match self {
            SchemaNode::Primitive(p) => Value::String(p.as_str().to_string()),
            SchemaNode::Array(element) => Value::Array(vec![element.to_value()]),
            SchemaNode::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }

    /// Short label used in generated comments and listings
    pub fn type_label(&self) -> &'static str {
        match self {
            SchemaNode::Primitive(p) => p.as_str(),
            SchemaNode::Array(_) => "array",
            SchemaNode::Object(_) => "object",
        }
    }

    /// Child nodes of an object node
    pub fn fields(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match self {
            SchemaNode::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a top-level field
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        self.fields().and_then(|f| f.get(name))
    }

    /// Top-level field names in declaration order; empty for non-object roots
    pub fn top_level_fields(&self) -> Vec<&str> {
        self.fields()
            .map(|f| f.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default()
    }

    /// Type label of a top-level field, `unknown` when the field is not declared
    pub fn field_type_label(&self, name: &str) -> &'static str {
        self.field(name).map(|n| n.type_label()).unwrap_or("unknown")
    }
}

impl Default for SchemaNode {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl TryFrom<Value> for SchemaNode {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        SchemaNode::from_value(&value)
    }
}

impl From<SchemaNode> for Value {
    fn from(node: SchemaNode) -> Self {
        node.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ui_schema() -> Value {
        json!({
            "elements": [
                {
                    "id": "string",
                    "x": "float",
                    "bbox": [{"x0": "float", "y0": "float"}],
                    "page": "integer"
                }
            ]
        })
    }

    #[test]
    fn test_parse_nested_schema() {
        let schema = SchemaNode::from_value(&ui_schema()).unwrap();
        assert_eq!(schema.top_level_fields(), vec!["elements"]);

        let SchemaNode::Array(element) = schema.field("elements").unwrap() else {
            panic!("elements should be an array node");
        };
        let fields = element.fields().unwrap();
        assert_eq!(
            fields.keys().collect::<Vec<_>>(),
            vec!["id", "x", "bbox", "page"]
        );
        assert_eq!(
            fields["page"],
            SchemaNode::Primitive(PrimitiveType::Integer)
        );
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let value = json!({"z": "string", "a": "number", "m": {"q": "boolean"}});
        let schema = SchemaNode::from_value(&value).unwrap();
        assert_eq!(schema.to_value(), value);
        assert_eq!(schema.top_level_fields(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_type_tags_are_case_insensitive() {
        let schema = SchemaNode::from_value(&json!({"a": "String", "b": "NUMBER"})).unwrap();
        assert_eq!(
            schema.field("a"),
            Some(&SchemaNode::Primitive(PrimitiveType::String))
        );
        assert_eq!(schema.field_type_label("b"), "number");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = SchemaNode::from_value(&json!({"a": {"b": "uuid"}})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                path: "a.b".to_string(),
                tag: "uuid".to_string()
            }
        );
    }

    #[test]
    fn test_array_needs_one_exemplar() {
        let err = SchemaNode::from_value(&json!({"tags": ["string", "number"]})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidArray { found: 2, .. }));

        let err = SchemaNode::from_value(&json!({"tags": []})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidArray { found: 0, .. }));
    }

    #[test]
    fn test_non_schema_leaf_rejected() {
        let err = SchemaNode::from_value(&json!({"a": 3})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNode { .. }));
    }

    #[test]
    fn test_labels() {
        let schema = SchemaNode::from_value(&ui_schema()).unwrap();
        assert_eq!(schema.field_type_label("elements"), "array");
        assert_eq!(schema.field_type_label("missing"), "unknown");
        assert_eq!(schema.type_label(), "object");
    }

    #[test]
    fn test_serde_uses_plain_json_form() {
        let schema: SchemaNode = serde_json::from_value(json!({"a": ["integer"]})).unwrap();
        assert_eq!(
            schema.field("a"),
            Some(&SchemaNode::Array(Box::new(SchemaNode::Primitive(
                PrimitiveType::Integer
            ))))
        );
        assert_eq!(serde_json::to_value(&schema).unwrap(), json!({"a": ["integer"]}));
    }
}
