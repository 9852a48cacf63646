//! API Mapping SDK - schema mapping and conversion-code generation
//!
//! Provides:
//! - A schema model for API response and UI requirement shapes
//! - A many-to-many field mapping store with per-field custom transforms
//! - Synthesis of a self-contained `convertData` conversion program
//! - A sandboxed evaluator to preview the program on sample data
//! - Structural validation of produced values against the target schema
//!
//! # Example
//!
//! ```rust
//! use api_mapping_sdk::{MappingSession, SchemaNode};
//! use serde_json::json;
//!
//! let source = SchemaNode::from_value(&json!({"x": "string", "y": "string"})).unwrap();
//! let target = SchemaNode::from_value(&json!({"a": "string", "b": "number"})).unwrap();
//!
//! let mut session = MappingSession::new(source, target);
//! session.on_mapping_toggle("a", "x");
//! session.on_mapping_toggle("b", "y");
//!
//! let outcome = session.run_preview(&json!({"x": "hello", "y": "5"}));
//! assert_eq!(outcome.result(), Some(&json!({"a": "hello", "b": "5"})));
//! ```

pub mod codegen;
pub mod config;
pub mod mapping;
pub mod preview;
pub mod schema;
pub mod script;
pub mod session;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;

pub use codegen::{override_template, synthesize};
pub use config::{ConfigError, NumericPolicy, ScriptLimits, SessionConfig};
pub use mapping::{
    FieldMapping, FieldStatus, MappingStats, MappingStore, ToggleOutcome, TransformOverrides,
};
pub use preview::{PreviewError, PreviewExecutor, PreviewOutcome, PreviewResult, preview};
pub use schema::{PrimitiveType, SchemaError, SchemaNode};
pub use script::{ScriptError, ScriptResult};
pub use session::MappingSession;
pub use validation::{ValidationIssue, Validator, validate, validate_issues};
