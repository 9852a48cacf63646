//! Preview executor running a conversion program against sample input

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use super::error::{PreviewError, PreviewResult};
use crate::codegen::ENTRY_POINT;
use crate::config::SessionConfig;
use crate::mapping::FieldMapping;
use crate::schema::SchemaNode;
use crate::script::{Interpreter, JsValue, ScriptError, parse};
use crate::validation::Validator;

/// Runs generated programs in an isolated evaluator
#[derive(Debug, Clone, Default)]
pub struct PreviewExecutor {
    config: SessionConfig,
}

impl PreviewExecutor {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Convert `sample` with `code` and check the output against `target`
    ///
    /// Every top-level target field must be mapped; otherwise the program
    /// is not run at all. The program is evaluated in a fresh scope that
    /// holds only the built-ins, and `convertData` receives a copy of the
    /// sample as its single argument.
    pub fn run(
        &self,
        sample: &Value,
        mapping: &FieldMapping,
        code: &str,
        target: &SchemaNode,
    ) -> PreviewResult<Value> {
        let _span = info_span!("preview", code_bytes = code.len()).entered();

        let unmapped = mapping.unmapped_fields(target);
        if !unmapped.is_empty() {
            debug!(fields = ?unmapped, "Preview stopped on unmapped fields");
            return Err(PreviewError::Unmapped { fields: unmapped });
        }

        let start = Instant::now();
        let output = self.execute(sample, code)?;

        let issues = Validator::with_policy(self.config.numeric_policy).validate(&output, target);
        if !issues.is_empty() {
            warn!(issues = issues.len(), "Preview output does not match target schema");
            return Err(PreviewError::Validation { issues });
        }

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Preview succeeded"
        );
        Ok(output)
    }

    /// Evaluate `code` and return the JSON form of `convertData(sample)`
    pub fn execute(&self, sample: &Value, code: &str) -> PreviewResult<Value> {
        let program = parse(code).map_err(PreviewError::MalformedProgram)?;

        let mut interp = Interpreter::new(self.config.limits);
        let result = interp
            .run(&program)
            .and_then(|()| {
                let entry = interp
                    .global(ENTRY_POINT)
                    .ok_or_else(|| ScriptError::Reference(ENTRY_POINT.to_string()))?;
                interp.call(&entry, vec![JsValue::from_json(sample)])
            })
            .and_then(|value| value.to_json());

        debug!(steps = interp.steps_used(), "Evaluated conversion program");
        result.map_err(|e| {
            warn!(error = %e, "Conversion program failed");
            PreviewError::Execution(e)
        })
    }
}

/// Preview with the default configuration
pub fn preview(
    sample: &Value,
    mapping: &FieldMapping,
    code: &str,
    target: &SchemaNode,
) -> PreviewResult<Value> {
    PreviewExecutor::default().run(sample, mapping, code, target)
}

/// Outcome of a preview as reported to callers: `{result}` or `{error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewOutcome {
    Result(Value),
    Error(String),
}

impl PreviewOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, PreviewOutcome::Result(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            PreviewOutcome::Result(value) => Some(value),
            PreviewOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PreviewOutcome::Result(_) => None,
            PreviewOutcome::Error(message) => Some(message),
        }
    }
}

impl From<PreviewResult<Value>> for PreviewOutcome {
    fn from(result: PreviewResult<Value>) -> Self {
        match result {
            Ok(value) => PreviewOutcome::Result(value),
            Err(err) => PreviewOutcome::Error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::synthesize;
    use crate::config::NumericPolicy;
    use crate::mapping::TransformOverrides;
    use serde_json::json;

    fn setup(
        source: Value,
        target: Value,
        pairs: &[(&str, &str)],
    ) -> (SchemaNode, SchemaNode, FieldMapping) {
        let source = SchemaNode::from_value(&source).unwrap();
        let target = SchemaNode::from_value(&target).unwrap();
        let mut mapping = FieldMapping::new();
        for (t, s) in pairs {
            mapping.toggle(t, s);
        }
        (source, target, mapping)
    }

    #[test]
    fn test_identity_preview() {
        let (source, target, mapping) = setup(
            json!({"x": "string", "y": "string"}),
            json!({"a": "string", "b": "number"}),
            &[("a", "x"), ("b", "y")],
        );
        let code = synthesize(&mapping, &source, &target, &TransformOverrides::new());
        let result = preview(&json!({"x": "hello", "y": "5"}), &mapping, &code, &target).unwrap();
        assert_eq!(result, json!({"a": "hello", "b": "5"}));
    }

    #[test]
    fn test_unmapped_fields_short_circuit() {
        let (_, target, mapping) = setup(
            json!({"x": "string"}),
            json!({"a": "string", "b": "string"}),
            &[("a", "x")],
        );
        // Not even valid code: the program must not be parsed or run
        let err = preview(&json!({}), &mapping, "this is not code {", &target).unwrap_err();
        assert_eq!(
            err,
            PreviewError::Unmapped {
                fields: vec!["b".to_string()]
            }
        );
    }

    #[test]
    fn test_malformed_program() {
        let (_, target, mapping) = setup(json!({"x": "string"}), json!({"a": "string"}), &[("a", "x")]);
        let err = preview(&json!({"x": "v"}), &mapping, "function convertData(data) {", &target)
            .unwrap_err();
        assert!(matches!(err, PreviewError::MalformedProgram(ref e) if e.is_syntax()));
    }

    #[test]
    fn test_runtime_exception_is_reported() {
        let (source, target, mapping) = setup(
            json!({"user": {"name": "string"}}),
            json!({"name": "string"}),
            &[("name", "user")],
        );
        let mut overrides = TransformOverrides::new();
        overrides.insert("name", "function f(user) { return user.profile.name; }");
        let code = synthesize(&mapping, &source, &target, &overrides);

        let err = preview(&json!({"user": {}}), &mapping, &code, &target).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Cannot read properties of undefined (reading 'name')"
        );
    }

    #[test]
    fn test_validation_failure() {
        let (source, target, mapping) = setup(
            json!({"x": "string"}),
            json!({"a": "integer"}),
            &[("a", "x")],
        );
        let code = synthesize(&mapping, &source, &target, &TransformOverrides::new());
        let err = preview(&json!({"x": "abc"}), &mapping, &code, &target).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Output schema validation failed: a: type mismatch, expected integer, got string"
        );
    }

    #[test]
    fn test_undefined_output_is_missing() {
        let (source, target, mapping) = setup(
            json!({"x": "string"}),
            json!({"a": "string"}),
            &[("a", "x")],
        );
        let code = synthesize(&mapping, &source, &target, &TransformOverrides::new());
        let err = preview(&json!({}), &mapping, &code, &target).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Output schema validation failed: missing field: a"
        );
    }

    #[test]
    fn test_strict_policy_from_config() {
        let (source, target, mapping) = setup(
            json!({"y": "string"}),
            json!({"b": "number"}),
            &[("b", "y")],
        );
        let code = synthesize(&mapping, &source, &target, &TransformOverrides::new());
        let executor =
            PreviewExecutor::new(SessionConfig::new().with_numeric_policy(NumericPolicy::Strict));
        let err = executor
            .run(&json!({"y": "5"}), &mapping, &code, &target)
            .unwrap_err();
        assert!(matches!(err, PreviewError::Validation { .. }));
    }

    #[test]
    fn test_runaway_program_is_stopped() {
        let (_, target, mapping) = setup(json!({"x": "string"}), json!({"a": "string"}), &[("a", "x")]);
        let code = "function spin(n) { return spin(n + 1); }\nfunction convertData(data) { return { a: spin(0) }; }";
        let err = preview(&json!({"x": "v"}), &mapping, code, &target).unwrap_err();
        assert!(matches!(
            err,
            PreviewError::Execution(ScriptError::CallDepthExceeded(_))
        ));
    }

    #[test]
    fn test_sample_is_not_mutated() {
        let (_, target, mapping) = setup(json!({"x": "string"}), json!({"a": "string"}), &[("a", "x")]);
        let code = "function convertData(data) { data.x = 'changed'; return { a: data.x }; }";
        let sample = json!({"x": "orig"});
        let result = preview(&sample, &mapping, code, &target).unwrap();
        assert_eq!(result, json!({"a": "changed"}));
        assert_eq!(sample, json!({"x": "orig"}));
    }

    #[test]
    fn test_outcome_serialization() {
        let ok: PreviewOutcome = Ok(json!({"a": 1})).into();
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"result": {"a": 1}}));
        assert!(ok.is_ok());

        let err: PreviewOutcome = Err(PreviewError::Unmapped {
            fields: vec!["b".to_string()],
        })
        .into();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"error": "field(s) not mapped: b"})
        );
        assert_eq!(err.error(), Some("field(s) not mapped: b"));
    }
}
