//! Schema model for the source (API response) and target (UI requirement) shapes
//!
//! A schema is a plain JSON tree:
//!
//! ```rust
//! use api_mapping_sdk::schema::SchemaNode;
//! use serde_json::json;
//!
//! let schema = SchemaNode::from_value(&json!({
//!     "id": "string",
//!     "elements": [{"x": "float", "page": "integer"}]
//! })).unwrap();
//!
//! assert_eq!(schema.top_level_fields(), vec!["id", "elements"]);
//! assert_eq!(schema.field_type_label("elements"), "array");
//! ```

mod error;
mod node;
pub mod path;

pub use error::{SchemaError, SchemaResult};
pub use node::{PrimitiveType, SchemaNode};
