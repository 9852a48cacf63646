//! Mapping store: the many-to-many field mapping plus per-field overrides

use tracing::debug;

use super::types::{FieldMapping, FieldStatus, MappingStats, ToggleOutcome, TransformOverrides};
use crate::schema::SchemaNode;

/// Owns the mapping and the custom transform overrides that hang off it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingStore {
    mapping: FieldMapping,
    overrides: TransformOverrides,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an existing mapping and overrides
    ///
    /// Overrides for targets that are not mapped are dropped.
    pub fn from_parts(mapping: FieldMapping, overrides: TransformOverrides) -> Self {
        let mut kept = TransformOverrides::new();
        for (target, text) in overrides.iter() {
            if mapping.contains_target(target) {
                kept.insert(target, text);
            } else {
                debug!(field = target, "Dropping override for unmapped field");
            }
        }
        Self {
            mapping,
            overrides: kept,
        }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn overrides(&self) -> &TransformOverrides {
        &self.overrides
    }

    /// Toggle `source` on `target`; clearing a target also drops its override
    pub fn toggle(&mut self, target: &str, source: &str) -> ToggleOutcome {
        let outcome = self.mapping.toggle(target, source);
        if outcome == ToggleOutcome::Cleared && self.overrides.remove(target).is_some() {
            debug!(field = target, "Removed override of cleared field");
        }
        debug!(field = target, source, ?outcome, "Mapping toggled");
        outcome
    }

    /// Save a custom function for `target`
    pub fn save_override(&mut self, target: &str, text: &str) {
        self.overrides.insert(target, text);
    }

    /// Drop the custom function for `target`, returning it
    pub fn remove_override(&mut self, target: &str) -> Option<String> {
        self.overrides.remove(target)
    }

    /// Reset to the empty mapping with no overrides
    pub fn clear(&mut self) {
        self.mapping = FieldMapping::new();
        self.overrides = TransformOverrides::new();
    }

    /// Status of every top-level target field, in schema order
    pub fn field_statuses(&self, target_schema: &SchemaNode) -> Vec<FieldStatus> {
        target_schema
            .fields()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(name, node)| FieldStatus {
                        field: name.clone(),
                        target_type: node.type_label().to_string(),
                        sources: self
                            .mapping
                            .sources(name)
                            .map(|s| s.to_vec())
                            .unwrap_or_default(),
                        has_override: self.overrides.contains(name),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Summary statistics against the two schemas
    pub fn stats(&self, source_schema: &SchemaNode, target_schema: &SchemaNode) -> MappingStats {
        let unmapped = self.mapping.unmapped_fields(target_schema);
        let target_fields = target_schema.top_level_fields().len();
        MappingStats {
            source_fields: source_schema.top_level_fields().len(),
            target_fields,
            mapped_fields: target_fields - unmapped.len(),
            override_count: self.overrides.len(),
            unmapped,
        }
    }
}
