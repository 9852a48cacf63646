//! Function synthesizer turning a field mapping into a conversion program
//!
//! ```rust
//! use api_mapping_sdk::codegen::synthesize;
//! use api_mapping_sdk::mapping::{FieldMapping, TransformOverrides};
//! use api_mapping_sdk::schema::SchemaNode;
//! use serde_json::json;
//!
//! let source = SchemaNode::from_value(&json!({"title": "string"})).unwrap();
//! let target = SchemaNode::from_value(&json!({"heading": "string"})).unwrap();
//! let mut mapping = FieldMapping::new();
//! mapping.toggle("heading", "title");
//!
//! let code = synthesize(&mapping, &source, &target, &TransformOverrides::new());
//! assert!(code.contains("heading: dispatch.heading(data.title)"));
//! ```

mod ident;
mod synthesize;
mod transform;

pub use ident::{is_identifier, property_access, sanitize_identifier};
pub use synthesize::{DISPATCH_TABLE, ENTRY_POINT, override_template, render, synthesize};
pub use transform::{FieldPlan, ProgramPlan, TransformExpr, strip_function_shell};
