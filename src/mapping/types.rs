//! Types for the field mapping between a source and a target schema

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

use crate::schema::SchemaNode;

/// Target field name -> ordered, duplicate-free list of source field names
///
/// A target key is only present while its list is non-empty. Iteration
/// follows the order in which target fields were first mapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(IndexMap<String, Vec<String>>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `source` to `target` if absent, remove it if present
    pub fn toggle(&mut self, target: &str, source: &str) -> ToggleOutcome {
        match self.0.entry(target.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(vec![source.to_string()]);
                ToggleOutcome::Added
            }
            Entry::Occupied(mut slot) => {
                let sources = slot.get_mut();
                if let Some(pos) = sources.iter().position(|s| s == source) {
                    sources.remove(pos);
                    if sources.is_empty() {
                        slot.shift_remove();
                        ToggleOutcome::Cleared
                    } else {
                        ToggleOutcome::Removed
                    }
                } else {
                    sources.push(source.to_string());
                    ToggleOutcome::Added
                }
            }
        }
    }

    /// Source fields mapped onto `target`
    pub fn sources(&self, target: &str) -> Option<&[String]> {
        self.0.get(target).map(|v| v.as_slice())
    }

    pub fn contains_target(&self, target: &str) -> bool {
        self.0.contains_key(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level target schema fields that have no source mapped
    pub fn unmapped_fields(&self, target_schema: &SchemaNode) -> Vec<String> {
        target_schema
            .top_level_fields()
            .into_iter()
            .filter(|field| self.sources(field).is_none_or(|s| s.is_empty()))
            .map(|field| field.to_string())
            .collect()
    }
}

impl<'a> IntoIterator for &'a FieldMapping {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// What a toggle did to the mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The source was appended
    Added,
    /// The source was removed and others remain
    Removed,
    /// The last source was removed and the target entry deleted
    Cleared,
}

/// User-authored function text per target field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformOverrides(IndexMap<String, String>);

impl TransformOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &str) -> Option<&str> {
        self.0.get(target).map(|s| s.as_str())
    }

    /// Store the function text for `target`, replacing any earlier one
    pub fn insert(&mut self, target: impl Into<String>, text: impl Into<String>) {
        self.0.insert(target.into(), text.into());
    }

    pub fn remove(&mut self, target: &str) -> Option<String> {
        self.0.shift_remove(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.0.contains_key(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Mapping state of one top-level target field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStatus {
    /// Target field name
    pub field: String,
    /// Declared type label of the target field
    pub target_type: String,
    /// Source fields mapped onto it, empty when unmapped
    pub sources: Vec<String>,
    /// Whether a custom function is saved for the field
    pub has_override: bool,
}

impl FieldStatus {
    pub fn is_mapped(&self) -> bool {
        !self.sources.is_empty()
    }

    /// One-line description used by listings
    pub fn describe(&self) -> String {
        if self.is_mapped() {
            format!("Mapped to: {}", self.sources.join(", "))
        } else {
            "Not mapped".to_string()
        }
    }
}

/// Statistics about the mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingStats {
    /// Top-level source fields
    pub source_fields: usize,
    /// Top-level target fields
    pub target_fields: usize,
    /// Target fields with at least one source
    pub mapped_fields: usize,
    /// Target fields with a custom function
    pub override_count: usize,
    /// Target fields still unmapped, in schema order
    pub unmapped: Vec<String>,
}

impl MappingStats {
    /// Fraction of target fields that are mapped
    pub fn coverage(&self) -> f64 {
        if self.target_fields == 0 {
            return 1.0;
        }
        self.mapped_fields as f64 / self.target_fields as f64
    }

    pub fn is_complete(&self) -> bool {
        self.unmapped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toggle_appends_in_order() {
        let mut mapping = FieldMapping::new();
        assert_eq!(mapping.toggle("name", "first"), ToggleOutcome::Added);
        assert_eq!(mapping.toggle("name", "last"), ToggleOutcome::Added);
        assert_eq!(
            mapping.sources("name"),
            Some(&["first".to_string(), "last".to_string()][..])
        );
    }

    #[test]
    fn test_toggle_twice_restores_previous_state() {
        let mut mapping = FieldMapping::new();
        mapping.toggle("a", "x");
        let before = mapping.clone();

        assert_eq!(mapping.toggle("a", "y"), ToggleOutcome::Added);
        assert_eq!(mapping.toggle("a", "y"), ToggleOutcome::Removed);
        assert_eq!(mapping, before);
    }

    #[test]
    fn test_removing_last_source_deletes_key() {
        let mut mapping = FieldMapping::new();
        mapping.toggle("a", "x");
        assert_eq!(mapping.toggle("a", "x"), ToggleOutcome::Cleared);
        assert!(!mapping.contains_target("a"));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_fan_out_allowed() {
        let mut mapping = FieldMapping::new();
        mapping.toggle("a", "shared");
        mapping.toggle("b", "shared");
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.targets().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_unmapped_fields_in_schema_order() {
        let schema = SchemaNode::from_value(&json!({"a": "string", "b": "number", "c": "boolean"}))
            .unwrap();
        let mut mapping = FieldMapping::new();
        mapping.toggle("b", "y");
        assert_eq!(mapping.unmapped_fields(&schema), vec!["a", "c"]);
    }

    #[test]
    fn test_mapping_serializes_as_plain_object() {
        let mut mapping = FieldMapping::new();
        mapping.toggle("a", "x");
        mapping.toggle("a", "y");
        assert_eq!(serde_json::to_value(&mapping).unwrap(), json!({"a": ["x", "y"]}));
    }

    #[test]
    fn test_field_status_describe() {
        let status = FieldStatus {
            field: "a".to_string(),
            target_type: "string".to_string(),
            sources: vec!["x".to_string(), "y".to_string()],
            has_override: false,
        };
        assert_eq!(status.describe(), "Mapped to: x, y");

        let status = FieldStatus {
            sources: Vec::new(),
            ..status
        };
        assert_eq!(status.describe(), "Not mapped");
    }

    #[test]
    fn test_mapping_stats_coverage() {
        let stats = MappingStats {
            source_fields: 5,
            target_fields: 4,
            mapped_fields: 3,
            override_count: 1,
            unmapped: vec!["d".to_string()],
        };
        assert!((stats.coverage() - 0.75).abs() < 0.001);
        assert!(!stats.is_complete());
        assert_eq!(MappingStats::default().coverage(), 1.0);
    }
}
