//! Identifier and property-name hygiene for generated code

use serde_json::Value;

const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this",
    "throw", "true", "try", "typeof", "undefined", "var", "void", "while", "with", "yield",
];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `name` can be used unquoted as a variable or property name
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return false,
    }
    chars.all(is_ident_part) && !RESERVED_WORDS.contains(&name)
}

/// Turn a field name into a valid identifier
///
/// Whitespace followed by a character merges into camelCase
/// (`"user name"` becomes `"userName"`). Other characters that cannot
/// appear in an identifier become `_`, a leading digit gets a `_` prefix
/// and reserved words get a `_` suffix.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            upper_next = true;
            continue;
        }
        let pieces: Vec<char> = if upper_next {
            c.to_uppercase().collect()
        } else {
            vec![c]
        };
        upper_next = false;
        for p in pieces {
            out.push(if is_ident_part(p) { p } else { '_' });
        }
    }

    if out.is_empty() {
        return "_".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if RESERVED_WORDS.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// Double-quoted string literal
pub fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Key in an object literal, quoted when needed
pub fn object_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// `base.name`, or `base["name"]` when `name` is not an identifier
pub fn property_access(base: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{}.{}", base, name)
    } else {
        format!("{}[{}]", base, quote(name))
    }
}

/// Field name safe to place inside a line or block comment
pub fn comment_text(text: &str) -> String {
    text.replace(['\n', '\r'], " ").replace("*/", "* /")
}

/// Hands out identifiers that are unique within one scope
#[derive(Debug, Default)]
pub(crate) struct NameAllocator {
    used: Vec<String>,
}

impl NameAllocator {
    pub(crate) fn allocate(&mut self, name: &str) -> String {
        let base = sanitize_identifier(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.used.push(candidate.clone());
        candidate
    }
}
