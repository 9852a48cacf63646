//! Mapping store for target (UI) fields fed by source (API) fields
//!
//! One target field may be fed by several source fields, and one source
//! field may feed several targets. Edits are toggle-style:
//!
//! ```rust
//! use api_mapping_sdk::mapping::{MappingStore, ToggleOutcome};
//!
//! let mut store = MappingStore::new();
//! assert_eq!(store.toggle("name", "first_name"), ToggleOutcome::Added);
//! assert_eq!(store.toggle("name", "first_name"), ToggleOutcome::Cleared);
//! assert!(store.mapping().is_empty());
//! ```

mod store;
mod types;

pub use store::MappingStore;
pub use types::{FieldMapping, FieldStatus, MappingStats, ToggleOutcome, TransformOverrides};
