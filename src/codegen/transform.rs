//! Per-field transform plan built from a mapping

use once_cell::sync::Lazy;
use regex::Regex;

use super::ident::NameAllocator;
use crate::mapping::{FieldMapping, TransformOverrides};
use crate::schema::SchemaNode;

/// Leading `function name(params) {` shell of a user-written function,
/// optionally preceded by line comments
static FUNCTION_SHELL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(?:\s*//[^\n]*\n)*\s*function\s+[A-Za-z_$][\w$]*\s*\([^)]*\)\s*\{").ok()
});

/// How one target field is computed from its source values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformExpr {
    /// Pass the single source value through
    Identity { param: String },
    /// Return the first of several source values
    FirstOf { params: Vec<String> },
    /// User-written function body
    Custom { params: Vec<String>, body: String },
}

impl TransformExpr {
    pub fn params(&self) -> &[String] {
        match self {
            TransformExpr::Identity { param } => std::slice::from_ref(param),
            TransformExpr::FirstOf { params } | TransformExpr::Custom { params, .. } => params,
        }
    }

    /// Render as an anonymous function expression
    pub fn to_function_source(&self) -> String {
        let params = self.params().join(", ");
        match self {
            TransformExpr::Identity { param } => {
                format!("function({}) {{ return {}; }}", param, param)
            }
            TransformExpr::FirstOf { params: list } => format!(
                "function({}) {{ return {}; }}",
                params,
                list.first().map(String::as_str).unwrap_or("undefined")
            ),
            TransformExpr::Custom { body, .. } => format!("function({}) {{ {} }}", params, body),
        }
    }
}

/// Remove the outer `function name(...) { ... }` shell from override text
///
/// Text without the shell is returned trimmed but otherwise unchanged.
pub fn strip_function_shell(text: &str) -> String {
    let trimmed = text.trim();
    match FUNCTION_SHELL.as_ref().and_then(|re| re.find(trimmed)) {
        Some(m) => {
            let rest = &trimmed[m.end()..];
            let rest = rest.strip_suffix('}').unwrap_or(rest);
            rest.trim().to_string()
        }
        None => trimmed.to_string(),
    }
}

/// Everything needed to emit one dispatch entry and output assignment
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    /// Literal target field name, used as the output key
    pub target: String,
    /// Sanitized dispatch table key
    pub key: String,
    /// Literal source field names, read from the input in order
    pub sources: Vec<String>,
    pub transform: TransformExpr,
    /// Declared type of each source field
    pub source_types: Vec<&'static str>,
    /// Declared type of the target field
    pub target_type: &'static str,
}

/// Ordered field plans for a whole conversion program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramPlan {
    pub fields: Vec<FieldPlan>,
}

impl ProgramPlan {
    pub fn build(
        mapping: &FieldMapping,
        source_schema: &SchemaNode,
        target_schema: &SchemaNode,
        overrides: &TransformOverrides,
    ) -> Self {
        let mut keys = NameAllocator::default();
        let fields = mapping
            .iter()
            .map(|(target, sources)| {
                let mut locals = NameAllocator::default();
                let params: Vec<String> = sources.iter().map(|s| locals.allocate(s)).collect();

                let transform = match overrides.get(target) {
                    Some(text) => TransformExpr::Custom {
                        params,
                        body: strip_function_shell(text),
                    },
                    None if params.len() == 1 => TransformExpr::Identity {
                        param: params[0].clone(),
                    },
                    None => TransformExpr::FirstOf { params },
                };

                FieldPlan {
                    target: target.to_string(),
                    key: keys.allocate(target),
                    sources: sources.to_vec(),
                    transform,
                    source_types: sources
                        .iter()
                        .map(|s| source_schema.field_type_label(s))
                        .collect(),
                    target_type: target_schema.field_type_label(target),
                }
            })
            .collect();
        Self { fields }
    }
}
