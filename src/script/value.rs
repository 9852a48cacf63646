//! Runtime values and conversions to and from JSON

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use super::ast::FunctionDef;
use super::error::{ScriptError, ScriptResult};
use super::interpreter::Env;

/// Nesting limit when converting script values to JSON
const MAX_JSON_DEPTH: usize = 256;

/// Longest string a script may build, in UTF-8 bytes
pub(crate) const MAX_STRING_LENGTH: usize = 1 << 24;

/// Longest array a script may build
pub(crate) const MAX_ARRAY_LENGTH: usize = 1 << 20;

pub type ArrayRef = Rc<RefCell<Vec<JsValue>>>;
pub type ObjectRef = Rc<RefCell<IndexMap<String, JsValue>>>;

#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Rc<Callable>),
}

pub enum Callable {
    Closure { def: Rc<FunctionDef>, env: Env },
    Native(Native),
}

/// Built-in functions reachable from scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    ParseFloat,
    ParseInt,
    StringCtor,
    NumberCtor,
    BooleanCtor,
    ErrorCtor,
    IsNaN,
    IsFinite,
    MathRound,
    MathFloor,
    MathCeil,
    MathAbs,
    MathMin,
    MathMax,
    MathTrunc,
    MathPow,
    MathSqrt,
    JsonStringify,
    JsonParse,
    ArrayIsArray,
    ObjectKeys,
    ObjectValues,
    ObjectEntries,
}

impl JsValue {
    pub fn string(s: impl Into<String>) -> Self {
        JsValue::String(s.into())
    }

    pub fn array(items: Vec<JsValue>) -> Self {
        JsValue::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, JsValue>) -> Self {
        JsValue::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn native(native: Native) -> Self {
        JsValue::Function(Rc::new(Callable::Native(native)))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null | JsValue::Array(_) | JsValue::Object(_) => "object",
            JsValue::Bool(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Function(_) => "function",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Bool(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Array(_) | JsValue::Object(_) | JsValue::Function(_) => true,
        }
    }

    /// Numeric conversion as done by `Number(value)`
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s),
            JsValue::Array(_) => string_to_number(&self.to_js_string()),
            JsValue::Object(_) | JsValue::Function(_) => f64::NAN,
        }
    }

    /// String conversion as done by `String(value)`
    pub fn to_js_string(&self) -> String {
        self.string_at(0)
    }

    fn string_at(&self, depth: usize) -> String {
        match self {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Bool(b) => b.to_string(),
            JsValue::Number(n) => number_to_string(*n),
            JsValue::String(s) => s.clone(),
            JsValue::Array(_) if depth > MAX_JSON_DEPTH => String::new(),
            JsValue::Array(items) => items
                .borrow()
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.string_at(depth + 1)
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            JsValue::Object(_) => "[object Object]".to_string(),
            JsValue::Function(_) => "function () { [code] }".to_string(),
        }
    }

    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
            (JsValue::Bool(a), JsValue::Bool(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Array(a), JsValue::Array(b)) => Rc::ptr_eq(a, b),
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            (JsValue::Function(a), JsValue::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==` comparison
    pub fn loose_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (JsValue::Number(_), JsValue::String(_))
            | (JsValue::String(_), JsValue::Number(_))
            | (JsValue::Bool(_), _)
            | (_, JsValue::Bool(_)) => self.to_number() == other.to_number(),
            (JsValue::Array(_) | JsValue::Object(_), JsValue::String(_) | JsValue::Number(_))
            | (JsValue::String(_) | JsValue::Number(_), JsValue::Array(_) | JsValue::Object(_)) => {
                let a = self.to_primitive();
                let b = other.to_primitive();
                a.loose_equals(&b)
            }
            _ => self.strict_equals(other),
        }
    }

    /// Equality used by `includes`: like `===` but NaN equals NaN
    pub fn same_value_zero(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Number(a), JsValue::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    /// Objects and arrays become their string form
    pub fn to_primitive(&self) -> JsValue {
        match self {
            JsValue::Array(_) | JsValue::Object(_) | JsValue::Function(_) => {
                JsValue::String(self.to_js_string())
            }
            other => other.clone(),
        }
    }

    /// Deep copy of a JSON value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => JsValue::Null,
            Value::Bool(b) => JsValue::Bool(*b),
            Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => JsValue::String(s.clone()),
            Value::Array(items) => JsValue::array(items.iter().map(JsValue::from_json).collect()),
            Value::Object(fields) => JsValue::object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), JsValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON with `JSON.stringify` rules
    ///
    /// `undefined` and functions are dropped from objects and become
    /// `null` inside arrays; non-finite numbers become `null`. A top-level
    /// `undefined` or function converts to `null`.
    pub fn to_json(&self) -> ScriptResult<Value> {
        self.to_json_at(0)
    }

    fn to_json_at(&self, depth: usize) -> ScriptResult<Value> {
        if depth > MAX_JSON_DEPTH {
            return Err(ScriptError::Conversion(
                "value is nested too deeply or contains a cycle".to_string(),
            ));
        }
        Ok(match self {
            JsValue::Undefined | JsValue::Null | JsValue::Function(_) => Value::Null,
            JsValue::Bool(b) => Value::Bool(*b),
            JsValue::Number(n) => number_to_json(*n),
            JsValue::String(s) => Value::String(s.clone()),
            JsValue::Array(items) => {
                let items = items.borrow();
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(item.to_json_at(depth + 1)?);
                }
                Value::Array(out)
            }
            JsValue::Object(fields) => {
                let fields = fields.borrow();
                let mut out = Map::new();
                for (key, item) in fields.iter() {
                    if matches!(item, JsValue::Undefined | JsValue::Function(_)) {
                        continue;
                    }
                    out.insert(key.clone(), item.to_json_at(depth + 1)?);
                }
                Value::Object(out)
            }
        })
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::String(s) => write!(f, "{:?}", s),
            JsValue::Function(_) => f.write_str("[Function]"),
            JsValue::Array(_) | JsValue::Object(_) => match self.to_json() {
                Ok(json) => write!(f, "{}", json),
                Err(_) => f.write_str("[Circular]"),
            },
            other => f.write_str(&other.to_js_string()),
        }
    }
}

/// Integral numbers become JSON integers, others floats, non-finite `null`
pub fn number_to_json(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Number formatting as done by `String(n)`
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Strict numeric parse of a whole string as done by `Number("...")`
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Longest numeric prefix as done by `parseFloat`
pub fn parse_float_prefix(s: &str) -> f64 {
    let t = s.trim_start();
    for (prefix, value) in [
        ("Infinity", f64::INFINITY),
        ("+Infinity", f64::INFINITY),
        ("-Infinity", f64::NEG_INFINITY),
    ] {
        if t.starts_with(prefix) {
            return value;
        }
    }

    let bytes = t.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_start {
            end = exp_end;
        }
    }
    t[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Integer prefix in the given radix as done by `parseInt`
pub fn parse_int_prefix(s: &str, radix: Option<u32>) -> f64 {
    let mut t = s.trim_start();
    let mut negative = false;
    if let Some(rest) = t.strip_prefix('-') {
        negative = true;
        t = rest;
    } else if let Some(rest) = t.strip_prefix('+') {
        t = rest;
    }

    let mut radix = radix.unwrap_or(0);
    if radix == 16 || radix == 0 {
        if let Some(rest) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            t = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let mut value = 0.0_f64;
    let mut any = false;
    for c in t.chars() {
        match c.to_digit(radix) {
            Some(d) => {
                value = value * radix as f64 + d as f64;
                any = true;
            }
            None => break,
        }
    }
    if !any {
        return f64::NAN;
    }
    if negative { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(5.0), "5");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("nan").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(parse_float_prefix("3.5abc"), 3.5);
        assert_eq!(parse_float_prefix("  -2e2x"), -200.0);
        assert_eq!(parse_float_prefix("1e"), 1.0);
        assert!(parse_float_prefix("abc").is_nan());
        assert!(parse_float_prefix(".").is_nan());

        assert_eq!(parse_int_prefix("42.9", None), 42.0);
        assert_eq!(parse_int_prefix("-17px", Some(10)), -17.0);
        assert_eq!(parse_int_prefix("0xff", Some(16)), 255.0);
        assert_eq!(parse_int_prefix("0xff", None), 255.0);
        assert_eq!(parse_int_prefix("101", Some(2)), 5.0);
        assert!(parse_int_prefix("x1", None).is_nan());
    }

    #[test]
    fn test_json_round_trip() {
        let value = json!({"a": 1, "b": [true, null, "x"], "c": {"d": 2.5}});
        let js = JsValue::from_json(&value);
        assert_eq!(js.to_json().unwrap(), value);
    }

    #[test]
    fn test_to_json_drops_undefined_members() {
        let mut fields = IndexMap::new();
        fields.insert("keep".to_string(), JsValue::Number(1.0));
        fields.insert("drop".to_string(), JsValue::Undefined);
        fields.insert(
            "list".to_string(),
            JsValue::array(vec![JsValue::Undefined, JsValue::Number(f64::NAN)]),
        );
        let js = JsValue::object(fields);
        assert_eq!(js.to_json().unwrap(), json!({"keep": 1, "list": [null, null]}));
    }

    #[test]
    fn test_cycle_is_reported() {
        let obj = JsValue::object(IndexMap::new());
        if let JsValue::Object(inner) = &obj {
            inner.borrow_mut().insert("me".to_string(), obj.clone());
        }
        assert!(matches!(obj.to_json(), Err(ScriptError::Conversion(_))));
        if let JsValue::Object(inner) = &obj {
            inner.borrow_mut().clear();
        }
    }

    #[test]
    fn test_equality() {
        let five = JsValue::Number(5.0);
        let five_str = JsValue::string("5");
        assert!(!five.strict_equals(&five_str));
        assert!(five.loose_equals(&five_str));
        assert!(JsValue::Null.loose_equals(&JsValue::Undefined));
        assert!(!JsValue::Null.loose_equals(&JsValue::Number(0.0)));
        assert!(JsValue::Bool(true).loose_equals(&JsValue::Number(1.0)));
        let nan = JsValue::Number(f64::NAN);
        assert!(!nan.strict_equals(&nan));
        assert!(nan.same_value_zero(&nan));
    }

    #[test]
    fn test_type_of_and_truthiness() {
        assert_eq!(JsValue::Null.type_of(), "object");
        assert_eq!(JsValue::array(vec![]).type_of(), "object");
        assert_eq!(JsValue::native(Native::ParseFloat).type_of(), "function");
        assert!(!JsValue::string("").truthy());
        assert!(JsValue::array(vec![]).truthy());
        assert!(!JsValue::Number(f64::NAN).truthy());
    }

    #[test]
    fn test_array_to_string() {
        let arr = JsValue::array(vec![
            JsValue::Number(1.0),
            JsValue::Null,
            JsValue::string("x"),
        ]);
        assert_eq!(arr.to_js_string(), "1,,x");
    }
}
