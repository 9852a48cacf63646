//! Editing session holding schemas, mapping, overrides and sample data
//!
//! A [`MappingSession`] is the single owner of all editing state. Every
//! mutation goes through it so the cached conversion program and the last
//! preview result are invalidated consistently.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codegen::{override_template, synthesize};
use crate::config::SessionConfig;
use crate::mapping::{
    FieldMapping, FieldStatus, MappingStats, MappingStore, ToggleOutcome, TransformOverrides,
};
use crate::preview::{PreviewExecutor, PreviewOutcome, PreviewResult};
use crate::schema::SchemaNode;

/// In-memory state of one mapping session
#[derive(Debug, Clone)]
pub struct MappingSession {
    source_schema: SchemaNode,
    target_schema: SchemaNode,
    store: MappingStore,
    sample: Value,
    executor: PreviewExecutor,
    cached_code: Option<String>,
    last_preview: Option<PreviewOutcome>,
}

impl Default for MappingSession {
    fn default() -> Self {
        Self::new(SchemaNode::empty_object(), SchemaNode::empty_object())
    }
}

impl MappingSession {
    /// Create a session with the default configuration
    pub fn new(source_schema: SchemaNode, target_schema: SchemaNode) -> Self {
        Self::with_config(source_schema, target_schema, SessionConfig::default())
    }

    pub fn with_config(
        source_schema: SchemaNode,
        target_schema: SchemaNode,
        config: SessionConfig,
    ) -> Self {
        Self {
            source_schema,
            target_schema,
            store: MappingStore::new(),
            sample: Value::Object(Default::default()),
            executor: PreviewExecutor::new(config),
            cached_code: None,
            last_preview: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        self.executor.config()
    }

    pub fn source_schema(&self) -> &SchemaNode {
        &self.source_schema
    }

    pub fn target_schema(&self) -> &SchemaNode {
        &self.target_schema
    }

    pub fn mapping(&self) -> &FieldMapping {
        self.store.mapping()
    }

    pub fn overrides(&self) -> &TransformOverrides {
        self.store.overrides()
    }

    pub fn sample_data(&self) -> &Value {
        &self.sample
    }

    /// Result of the most recent preview, if still current
    pub fn last_preview(&self) -> Option<&PreviewOutcome> {
        self.last_preview.as_ref()
    }

    /// Whether a generated program is memoized
    pub fn has_cached_code(&self) -> bool {
        self.cached_code.is_some()
    }

    fn invalidate(&mut self) {
        self.cached_code = None;
        self.last_preview = None;
    }

    /// Add `source` to `target` if absent, remove it if present
    ///
    /// Unknown field names are accepted as free-form keys.
    pub fn on_mapping_toggle(&mut self, target: &str, source: &str) -> ToggleOutcome {
        if self.target_schema.field(target).is_none() {
            warn!(field = target, "Toggled target field is not in the target schema");
        }
        if self.source_schema.field(source).is_none() {
            warn!(field = source, "Toggled source field is not in the source schema");
        }
        let outcome = self.store.toggle(target, source);
        self.invalidate();
        outcome
    }

    /// Save a custom function for `target` and regenerate the program
    pub fn on_override_save(&mut self, target: &str, text: &str) {
        if !self.store.mapping().contains_target(target) {
            warn!(
                field = target,
                "Override saved for a field with no mapping; it is unused until the field is mapped"
            );
        }
        self.store.save_override(target, text);
        self.invalidate();
        let code = self.generated_code();
        debug!(field = target, bytes = code.len(), "Regenerated program after override save");
    }

    /// Drop the custom function for `target`
    pub fn remove_override(&mut self, target: &str) -> Option<String> {
        let removed = self.store.remove_override(target);
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    /// The conversion program for the current mapping and overrides
    pub fn generated_code(&mut self) -> &str {
        let store = &self.store;
        let (source, target) = (&self.source_schema, &self.target_schema);
        self.cached_code
            .get_or_insert_with(|| synthesize(store.mapping(), source, target, store.overrides()))
    }

    /// Editable template for a custom function on a mapped field
    pub fn override_template(&self, target: &str) -> Option<String> {
        let sources = self.store.mapping().sources(target)?;
        Some(override_template(
            target,
            sources,
            &self.source_schema,
            &self.target_schema,
        ))
    }

    /// Convert `sample` with the current program, keeping the typed error
    pub fn preview(&mut self, sample: &Value) -> PreviewResult<Value> {
        let store = &self.store;
        let (source, target) = (&self.source_schema, &self.target_schema);
        let code = self
            .cached_code
            .get_or_insert_with(|| synthesize(store.mapping(), source, target, store.overrides()));
        let result = self.executor.run(sample, store.mapping(), code, target);
        self.last_preview = Some(PreviewOutcome::from(result.clone()));
        result
    }

    /// Convert `sample` and report `{result}` or `{error}`
    pub fn run_preview(&mut self, sample: &Value) -> PreviewOutcome {
        let outcome = PreviewOutcome::from(self.preview(sample));
        if let PreviewOutcome::Error(message) = &outcome {
            debug!(error = %message, "Preview failed");
        }
        outcome
    }

    /// Replace the stored sample input
    pub fn set_sample_data(&mut self, sample: Value) {
        self.sample = sample;
        self.last_preview = None;
    }

    /// Preview against the stored sample input
    pub fn run_preview_with_sample(&mut self) -> PreviewOutcome {
        let sample = self.sample.clone();
        self.run_preview(&sample)
    }

    /// Replace the source schema, resetting mapping, overrides and caches
    pub fn set_source_schema(&mut self, schema: SchemaNode) {
        self.source_schema = schema;
        self.reset_mapping();
        info!(
            fields = self.source_schema.top_level_fields().len(),
            "Source schema replaced"
        );
    }

    /// Replace the target schema, resetting mapping, overrides and caches
    pub fn set_target_schema(&mut self, schema: SchemaNode) {
        self.target_schema = schema;
        self.reset_mapping();
        info!(
            fields = self.target_schema.top_level_fields().len(),
            "Target schema replaced"
        );
    }

    fn reset_mapping(&mut self) {
        self.store.clear();
        self.invalidate();
    }

    pub fn field_statuses(&self) -> Vec<FieldStatus> {
        self.store.field_statuses(&self.target_schema)
    }

    pub fn stats(&self) -> MappingStats {
        self.store.stats(&self.source_schema, &self.target_schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> MappingSession {
        let source = SchemaNode::from_value(&json!({"x": "string", "y": "string"})).unwrap();
        let target = SchemaNode::from_value(&json!({"a": "string", "b": "number"})).unwrap();
        MappingSession::new(source, target)
    }

    #[test]
    fn test_code_is_memoized_and_invalidated() {
        let mut s = session();
        assert!(!s.has_cached_code());
        let first = s.generated_code().to_string();
        assert!(s.has_cached_code());
        assert!(first.contains("// No mappings defined"));

        s.on_mapping_toggle("a", "x");
        assert!(!s.has_cached_code());
        assert!(s.generated_code().contains("a: dispatch.a(data.x)"));
    }

    #[test]
    fn test_override_save_regenerates() {
        let mut s = session();
        s.on_mapping_toggle("a", "x");
        s.on_override_save("a", "function t(x) { return x.toUpperCase(); }");
        assert!(s.has_cached_code());
        assert!(s
            .generated_code()
            .contains("a: function(x) { return x.toUpperCase(); }"));
    }

    #[test]
    fn test_preview_records_outcome() {
        let mut s = session();
        s.on_mapping_toggle("a", "x");
        s.on_mapping_toggle("b", "y");
        let outcome = s.run_preview(&json!({"x": "hello", "y": "5"}));
        assert_eq!(outcome.result(), Some(&json!({"a": "hello", "b": "5"})));
        assert_eq!(s.last_preview(), Some(&outcome));

        s.on_mapping_toggle("b", "y");
        assert!(s.last_preview().is_none());
    }

    #[test]
    fn test_source_schema_replacement_resets_state() {
        let mut s = session();
        s.on_mapping_toggle("a", "x");
        s.on_override_save("a", "return x;");
        s.run_preview(&json!({"x": "v"}));

        s.set_source_schema(SchemaNode::from_value(&json!({"z": "string"})).unwrap());
        assert!(s.mapping().is_empty());
        assert!(s.overrides().is_empty());
        assert!(!s.has_cached_code());
        assert!(s.last_preview().is_none());
    }

    #[test]
    fn test_sample_data_replacement_keeps_mapping() {
        let mut s = session();
        s.on_mapping_toggle("a", "x");
        s.on_mapping_toggle("b", "y");
        s.set_sample_data(json!({"x": "one", "y": 2}));
        let outcome = s.run_preview_with_sample();
        assert_eq!(outcome.result(), Some(&json!({"a": "one", "b": 2})));

        s.set_sample_data(json!({"x": "two", "y": 3}));
        assert!(s.last_preview().is_none());
        assert_eq!(s.mapping().len(), 2);
    }

    #[test]
    fn test_override_template_for_mapped_field() {
        let mut s = session();
        assert!(s.override_template("a").is_none());
        s.on_mapping_toggle("a", "x");
        let template = s.override_template("a").unwrap();
        assert!(template.starts_with("function transform(x) {"));
        assert!(template.contains("Output: a: string"));
    }
}
