//! Conversion program synthesis

use tracing::debug;

use super::ident::{NameAllocator, comment_text, object_key, property_access};
use super::transform::{FieldPlan, ProgramPlan};
use crate::mapping::{FieldMapping, TransformOverrides};
use crate::schema::SchemaNode;

/// Name of the generated dispatch table
pub const DISPATCH_TABLE: &str = "dispatch";

/// Name of the generated entry point
pub const ENTRY_POINT: &str = "convertData";

/// Generate the conversion program for a mapping
///
/// The result defines a `dispatch` table holding one transform function
/// per mapped target field, and a `convertData(data)` function that calls
/// each of them with the mapped source values and returns the assembled
/// output object. The output is a pure function of the inputs.
pub fn synthesize(
    mapping: &FieldMapping,
    source_schema: &SchemaNode,
    target_schema: &SchemaNode,
    overrides: &TransformOverrides,
) -> String {
    let plan = ProgramPlan::build(mapping, source_schema, target_schema, overrides);
    let code = render(&plan);
    debug!(
        fields = plan.fields.len(),
        overrides = overrides.len(),
        bytes = code.len(),
        "Synthesized conversion program"
    );
    code
}

/// Render a plan as program text
pub fn render(plan: &ProgramPlan) -> String {
    let table = if plan.fields.is_empty() {
        format!("const {} = {{}};", DISPATCH_TABLE)
    } else {
        let entries: Vec<String> = plan
            .fields
            .iter()
            .map(|f| format!("  {}: {}", f.key, f.transform.to_function_source()))
            .collect();
        format!("const {} = {{\n{}\n}};", DISPATCH_TABLE, entries.join(",\n"))
    };

    let body = if plan.fields.is_empty() {
        "    // No mappings defined".to_string()
    } else {
        plan.fields
            .iter()
            .map(render_assignment)
            .collect::<Vec<_>>()
            .join(",\n\n")
    };

    format!(
        "{}\n\nfunction {}(data) {{\n  return {{\n{}\n  }};\n}}",
        table, ENTRY_POINT, body
    )
}

fn render_assignment(field: &FieldPlan) -> String {
    let inputs: Vec<String> = field
        .sources
        .iter()
        .zip(&field.source_types)
        .map(|(name, ty)| format!("{}: {}", comment_text(name), ty))
        .collect();
    let args: Vec<String> = field
        .sources
        .iter()
        .map(|name| property_access("data", name))
        .collect();
    format!(
        "    // Input: {}\n    // Output: {}: {}\n    {}: {}.{}({})",
        inputs.join(", "),
        comment_text(&field.target),
        field.target_type,
        object_key(&field.target),
        DISPATCH_TABLE,
        field.key,
        args.join(", ")
    )
}

/// Editable starting text for a custom transform
///
/// The template is a `function transform(...)` whose parameters are the
/// mapped source fields. Saved unchanged as an override it returns the
/// first source value, the same as the default transform.
pub fn override_template(
    target_field: &str,
    source_fields: &[String],
    source_schema: &SchemaNode,
    target_schema: &SchemaNode,
) -> String {
    let mut names = NameAllocator::default();
    let params: Vec<String> = source_fields.iter().map(|s| names.allocate(s)).collect();
    let inputs: Vec<String> = source_fields
        .iter()
        .map(|s| format!("{}: {}", comment_text(s), source_schema.field_type_label(s)))
        .collect();
    let first = params
        .first()
        .cloned()
        .unwrap_or_else(|| "undefined".to_string());

    format!(
        "function transform({}) {{\n  /* Input: {}\n     Output: {}: {} */\n  return {};\n}}",
        params.join(", "),
        inputs.join(", "),
        comment_text(target_field),
        target_schema.field_type_label(target_field),
        first
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::strip_function_shell;
    use serde_json::json;

    fn schemas() -> (SchemaNode, SchemaNode) {
        let source = SchemaNode::from_value(&json!({
            "first_name": "string",
            "last_name": "string",
            "age": "integer"
        }))
        .unwrap();
        let target = SchemaNode::from_value(&json!({
            "full name": "string",
            "age": "number"
        }))
        .unwrap();
        (source, target)
    }

    #[test]
    fn test_empty_mapping() {
        let (source, target) = schemas();
        let code = synthesize(
            &FieldMapping::new(),
            &source,
            &target,
            &TransformOverrides::new(),
        );
        assert_eq!(
            code,
            "const dispatch = {};\n\nfunction convertData(data) {\n  return {\n    // No mappings defined\n  };\n}"
        );
    }

    #[test]
    fn test_generated_layout() {
        let (source, target) = schemas();
        let mut mapping = FieldMapping::new();
        mapping.toggle("full name", "first_name");
        mapping.toggle("full name", "last_name");
        mapping.toggle("age", "age");

        let code = synthesize(&mapping, &source, &target, &TransformOverrides::new());
        let expected = r#"const dispatch = {
  fullName: function(first_name, last_name) { return first_name; },
  age: function(age) { return age; }
};

function convertData(data) {
  return {
    // Input: first_name: string, last_name: string
    // Output: full name: string
    "full name": dispatch.fullName(data.first_name, data.last_name),

    // Input: age: integer
    // Output: age: number
    age: dispatch.age(data.age)
  };
}"#;
        assert_eq!(code, expected);
    }

    #[test]
    fn test_deterministic() {
        let (source, target) = schemas();
        let mut mapping = FieldMapping::new();
        mapping.toggle("age", "age");
        mapping.toggle("full name", "last_name");
        let mut overrides = TransformOverrides::new();
        overrides.insert("age", "function f(age) { return age + 1; }");

        let first = synthesize(&mapping, &source, &target, &overrides);
        let second = synthesize(&mapping, &source, &target, &overrides);
        assert_eq!(first, second);
    }

    #[test]
    fn test_override_body_verbatim() {
        let (source, target) = schemas();
        let mut mapping = FieldMapping::new();
        mapping.toggle("full name", "first_name");
        mapping.toggle("full name", "last_name");
        let mut overrides = TransformOverrides::new();
        overrides.insert(
            "full name",
            "function join(a, b) {\n  return first_name + ' ' + last_name;\n}",
        );

        let code = synthesize(&mapping, &source, &target, &overrides);
        assert!(code.contains(
            "fullName: function(first_name, last_name) { return first_name + ' ' + last_name; }"
        ));
        assert!(!code.contains("function join"));
        assert!(!code.contains("{ return first_name; }"));
    }

    #[test]
    fn test_unknown_types_are_labelled() {
        let (source, target) = schemas();
        let mut mapping = FieldMapping::new();
        mapping.toggle("nickname", "handle");
        let code = synthesize(&mapping, &source, &target, &TransformOverrides::new());
        assert!(code.contains("// Input: handle: unknown"));
        assert!(code.contains("// Output: nickname: unknown"));
    }

    #[test]
    fn test_override_template() {
        let (source, target) = schemas();
        let sources = vec!["first_name".to_string(), "last_name".to_string()];
        let template = override_template("full name", &sources, &source, &target);
        assert_eq!(
            template,
            "function transform(first_name, last_name) {\n  /* Input: first_name: string, last_name: string\n     Output: full name: string */\n  return first_name;\n}"
        );
        assert!(strip_function_shell(&template).ends_with("return first_name;"));
    }
}
