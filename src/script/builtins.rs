//! Global objects and methods on primitive values and arrays

use indexmap::IndexMap;

use super::error::{ScriptError, ScriptResult};
use super::interpreter::{Env, Interpreter, declare};
use super::value::{
    ArrayRef, JsValue, MAX_ARRAY_LENGTH, MAX_STRING_LENGTH, Native, number_to_string,
    parse_float_prefix, parse_int_prefix,
};

/// Bind the built-in globals into a fresh scope
pub(crate) fn install_globals(env: &Env) {
    let functions = [
        ("parseFloat", Native::ParseFloat),
        ("parseInt", Native::ParseInt),
        ("String", Native::StringCtor),
        ("Number", Native::NumberCtor),
        ("Boolean", Native::BooleanCtor),
        ("Error", Native::ErrorCtor),
        ("isNaN", Native::IsNaN),
        ("isFinite", Native::IsFinite),
    ];
    for (name, native) in functions {
        declare(env, name, JsValue::native(native), false);
    }
    declare(env, "NaN", JsValue::Number(f64::NAN), false);
    declare(env, "Infinity", JsValue::Number(f64::INFINITY), false);

    let mut math = namespace(&[
        ("round", Native::MathRound),
        ("floor", Native::MathFloor),
        ("ceil", Native::MathCeil),
        ("abs", Native::MathAbs),
        ("min", Native::MathMin),
        ("max", Native::MathMax),
        ("trunc", Native::MathTrunc),
        ("pow", Native::MathPow),
        ("sqrt", Native::MathSqrt),
    ]);
    math.insert("PI".to_string(), JsValue::Number(std::f64::consts::PI));
    declare(env, "Math", JsValue::object(math), false);

    let json = namespace(&[
        ("stringify", Native::JsonStringify),
        ("parse", Native::JsonParse),
    ]);
    declare(env, "JSON", JsValue::object(json), false);

    let array = namespace(&[("isArray", Native::ArrayIsArray)]);
    declare(env, "Array", JsValue::object(array), false);

    let object = namespace(&[
        ("keys", Native::ObjectKeys),
        ("values", Native::ObjectValues),
        ("entries", Native::ObjectEntries),
    ]);
    declare(env, "Object", JsValue::object(object), false);
}

fn namespace(entries: &[(&str, Native)]) -> IndexMap<String, JsValue> {
    entries
        .iter()
        .map(|(name, native)| (name.to_string(), JsValue::native(*native)))
        .collect()
}

/// Error object with `name` and `message` members
pub(crate) fn make_error(name: &str, message: &str) -> JsValue {
    let mut fields = IndexMap::new();
    fields.insert("name".to_string(), JsValue::string(name));
    fields.insert("message".to_string(), JsValue::string(message));
    JsValue::object(fields)
}

fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}

fn number_arg(args: &[JsValue], i: usize) -> f64 {
    arg(args, i).to_number()
}

pub(crate) fn call_native(native: Native, args: Vec<JsValue>) -> ScriptResult<JsValue> {
    Ok(match native {
        Native::ParseFloat => JsValue::Number(parse_float_prefix(&arg(&args, 0).to_js_string())),
        Native::ParseInt => {
            let radix = match arg(&args, 1) {
                JsValue::Undefined => None,
                value => {
                    let r = value.to_number();
                    if r.is_nan() || r == 0.0 {
                        None
                    } else {
                        Some(r.trunc().max(0.0) as u32)
                    }
                }
            };
            JsValue::Number(parse_int_prefix(&arg(&args, 0).to_js_string(), radix))
        }
        Native::StringCtor => {
            JsValue::String(args.first().map(JsValue::to_js_string).unwrap_or_default())
        }
        Native::NumberCtor => JsValue::Number(args.first().map(JsValue::to_number).unwrap_or(0.0)),
        Native::BooleanCtor => JsValue::Bool(arg(&args, 0).truthy()),
        Native::ErrorCtor => {
            let message = match arg(&args, 0) {
                JsValue::Undefined => String::new(),
                value => value.to_js_string(),
            };
            make_error("Error", &message)
        }
        Native::IsNaN => JsValue::Bool(number_arg(&args, 0).is_nan()),
        Native::IsFinite => JsValue::Bool(number_arg(&args, 0).is_finite()),
        Native::MathRound => JsValue::Number((number_arg(&args, 0) + 0.5).floor()),
        Native::MathFloor => JsValue::Number(number_arg(&args, 0).floor()),
        Native::MathCeil => JsValue::Number(number_arg(&args, 0).ceil()),
        Native::MathAbs => JsValue::Number(number_arg(&args, 0).abs()),
        Native::MathTrunc => JsValue::Number(number_arg(&args, 0).trunc()),
        Native::MathSqrt => JsValue::Number(number_arg(&args, 0).sqrt()),
        Native::MathPow => JsValue::Number(number_arg(&args, 0).powf(number_arg(&args, 1))),
        Native::MathMin => JsValue::Number(fold_numbers(&args, f64::INFINITY, f64::min)),
        Native::MathMax => JsValue::Number(fold_numbers(&args, f64::NEG_INFINITY, f64::max)),
        Native::JsonStringify => {
            let value = arg(&args, 0);
            if matches!(value, JsValue::Undefined | JsValue::Function(_)) {
                return Ok(JsValue::Undefined);
            }
            let json = value.to_json()?;
            let pretty = match arg(&args, 2) {
                JsValue::Number(n) => n >= 1.0,
                JsValue::String(s) => !s.is_empty(),
                _ => false,
            };
            let text = if pretty {
                serde_json::to_string_pretty(&json)
            } else {
                serde_json::to_string(&json)
            }
            .map_err(|e| ScriptError::Conversion(e.to_string()))?;
            JsValue::String(text)
        }
        Native::JsonParse => {
            let text = arg(&args, 0).to_js_string();
            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| ScriptError::Thrown(format!("SyntaxError: {}", e)))?;
            JsValue::from_json(&json)
        }
        Native::ArrayIsArray => JsValue::Bool(matches!(arg(&args, 0), JsValue::Array(_))),
        Native::ObjectKeys => JsValue::array(
            entries_of(&arg(&args, 0))?
                .into_iter()
                .map(|(k, _)| JsValue::String(k))
                .collect(),
        ),
        Native::ObjectValues => JsValue::array(
            entries_of(&arg(&args, 0))?
                .into_iter()
                .map(|(_, v)| v)
                .collect(),
        ),
        Native::ObjectEntries => JsValue::array(
            entries_of(&arg(&args, 0))?
                .into_iter()
                .map(|(k, v)| JsValue::array(vec![JsValue::String(k), v]))
                .collect(),
        ),
    })
}

fn fold_numbers(args: &[JsValue], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn entries_of(value: &JsValue) -> ScriptResult<Vec<(String, JsValue)>> {
    Ok(match value {
        JsValue::Undefined | JsValue::Null => {
            return Err(ScriptError::type_error(
                "Cannot convert undefined or null to object",
            ));
        }
        JsValue::Object(fields) => fields
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        JsValue::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        JsValue::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), JsValue::string(c)))
            .collect(),
        _ => Vec::new(),
    })
}

/// Call a method on a string, number, boolean or array receiver
pub(crate) fn call_method(
    interp: &mut Interpreter,
    receiver: &JsValue,
    name: &str,
    args: Vec<JsValue>,
    what: &str,
) -> ScriptResult<JsValue> {
    let result = match receiver {
        JsValue::String(s) => string_method(interp, s, name, &args)?,
        JsValue::Array(items) => array_method(interp, receiver, items, name, &args)?,
        JsValue::Number(n) => number_method(*n, name, &args)?,
        JsValue::Bool(b) if name == "toString" => Some(JsValue::string(b.to_string())),
        _ => None,
    };
    result.ok_or_else(|| ScriptError::type_error(format!("{} is not a function", what)))
}

/// Resolve a possibly negative position against a length
fn relative_index(value: &JsValue, len: usize, default: usize) -> usize {
    if matches!(value, JsValue::Undefined) {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn clamp_index(value: &JsValue, len: usize, default: usize) -> usize {
    if matches!(value, JsValue::Undefined) {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    n.trunc().clamp(0.0, len as f64) as usize
}

fn checked_string(s: String) -> ScriptResult<JsValue> {
    if s.len() > MAX_STRING_LENGTH {
        return Err(ScriptError::invalid_string_length());
    }
    Ok(JsValue::String(s))
}

fn pad(s: &str, args: &[JsValue], at_start: bool) -> ScriptResult<JsValue> {
    let target = number_arg(args, 0);
    let fill = match arg(args, 1) {
        JsValue::Undefined => " ".to_string(),
        value => value.to_js_string(),
    };
    let len = s.chars().count();
    if target.is_nan() || target <= len as f64 || fill.is_empty() {
        return Ok(JsValue::string(s));
    }
    if target > MAX_STRING_LENGTH as f64 {
        return Err(ScriptError::invalid_string_length());
    }
    let padding: String = fill.chars().cycle().take(target as usize - len).collect();
    checked_string(if at_start {
        padding + s
    } else {
        s.to_string() + &padding
    })
}

fn string_method(
    interp: &mut Interpreter,
    s: &str,
    name: &str,
    args: &[JsValue],
) -> ScriptResult<Option<JsValue>> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let value = match name {
        "toUpperCase" => JsValue::string(s.to_uppercase()),
        "toLowerCase" => JsValue::string(s.to_lowercase()),
        "trim" => JsValue::string(s.trim()),
        "trimStart" => JsValue::string(s.trim_start()),
        "trimEnd" => JsValue::string(s.trim_end()),
        "toString" | "valueOf" => JsValue::string(s),
        "split" => {
            let limit = match arg(args, 1) {
                JsValue::Undefined => usize::MAX,
                value => value.to_number().max(0.0) as usize,
            };
            let parts: Vec<JsValue> = match arg(args, 0) {
                JsValue::Undefined => vec![JsValue::string(s)],
                sep => {
                    let sep = sep.to_js_string();
                    if sep.is_empty() {
                        chars.iter().map(|c| JsValue::string(*c)).collect()
                    } else {
                        s.split(sep.as_str()).map(JsValue::string).collect()
                    }
                }
            };
            JsValue::array(parts.into_iter().take(limit).collect())
        }
        "includes" => JsValue::Bool(s.contains(arg(args, 0).to_js_string().as_str())),
        "startsWith" => JsValue::Bool(s.starts_with(arg(args, 0).to_js_string().as_str())),
        "endsWith" => JsValue::Bool(s.ends_with(arg(args, 0).to_js_string().as_str())),
        "indexOf" => {
            let needle = arg(args, 0).to_js_string();
            match s.find(needle.as_str()) {
                Some(byte) => JsValue::Number(s[..byte].chars().count() as f64),
                None => JsValue::Number(-1.0),
            }
        }
        "slice" => {
            let start = relative_index(&arg(args, 0), len, 0);
            let end = relative_index(&arg(args, 1), len, len);
            JsValue::String(if start < end {
                chars[start..end].iter().collect()
            } else {
                String::new()
            })
        }
        "substring" => {
            let a = clamp_index(&arg(args, 0), len, 0);
            let b = clamp_index(&arg(args, 1), len, len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            JsValue::String(chars[start..end].iter().collect())
        }
        "charAt" => {
            let i = number_arg(args, 0);
            let i = if i.is_nan() { 0.0 } else { i.trunc() };
            JsValue::String(if i >= 0.0 && (i as usize) < len {
                chars[i as usize].to_string()
            } else {
                String::new()
            })
        }
        "concat" => {
            let mut out = s.to_string();
            for value in args {
                out.push_str(&value.to_js_string());
                if out.len() > MAX_STRING_LENGTH {
                    return Err(ScriptError::invalid_string_length());
                }
            }
            JsValue::String(out)
        }
        "repeat" => {
            let n = number_arg(args, 0);
            if n.is_nan() || n < 0.0 || n.is_infinite() {
                return Err(ScriptError::Thrown(format!(
                    "RangeError: Invalid count value: {}",
                    number_to_string(n)
                )));
            }
            if s.is_empty() {
                return Ok(Some(JsValue::string("")));
            }
            match s.len().checked_mul(n as usize) {
                Some(total) if total <= MAX_STRING_LENGTH => JsValue::String(s.repeat(n as usize)),
                _ => return Err(ScriptError::invalid_string_length()),
            }
        }
        "padStart" => pad(s, args, true)?,
        "padEnd" => pad(s, args, false)?,
        "replace" | "replaceAll" => {
            let pattern = arg(args, 0).to_js_string();
            let replacement = arg(args, 1);
            let count = if name == "replace" { 1 } else { usize::MAX };
            checked_string(replace(interp, s, &pattern, &replacement, count)?)?
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn replace(
    interp: &mut Interpreter,
    s: &str,
    pattern: &str,
    replacement: &JsValue,
    count: usize,
) -> ScriptResult<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    let mut done = 0;
    while done < count {
        let Some(pos) = rest.find(pattern) else {
            break;
        };
        out.push_str(&rest[..pos]);
        let text = match replacement {
            JsValue::Function(_) => interp
                .call_value(replacement, vec![JsValue::string(pattern)], "replacer")?
                .to_js_string(),
            other => other.to_js_string(),
        };
        out.push_str(&text);
        if pattern.is_empty() {
            // Empty pattern matches between every character
            let Some(c) = rest.chars().next() else {
                rest = "";
                break;
            };
            out.push(c);
            rest = &rest[c.len_utf8()..];
        } else {
            rest = &rest[pos + pattern.len()..];
        }
        done += 1;
    }
    out.push_str(rest);
    Ok(out)
}

fn require_callback<'a>(args: &'a [JsValue], name: &str) -> ScriptResult<&'a JsValue> {
    match args.first() {
        Some(f @ JsValue::Function(_)) => Ok(f),
        Some(other) => Err(ScriptError::type_error(format!(
            "{} is not a function",
            other.to_js_string()
        ))),
        None => Err(ScriptError::type_error(format!(
            "undefined is not a function (in {})",
            name
        ))),
    }
}

fn array_method(
    interp: &mut Interpreter,
    receiver: &JsValue,
    items: &ArrayRef,
    name: &str,
    args: &[JsValue],
) -> ScriptResult<Option<JsValue>> {
    // Callbacks may mutate the array, so iterate over a copy
    let snapshot = items.borrow().clone();
    let len = snapshot.len();
    let value = match name {
        "map" => {
            let f = require_callback(args, name)?;
            let mut out = Vec::with_capacity(len);
            for (i, item) in snapshot.into_iter().enumerate() {
                out.push(callback(interp, f, item, i, receiver)?);
            }
            JsValue::array(out)
        }
        "filter" => {
            let f = require_callback(args, name)?;
            let mut out = Vec::new();
            for (i, item) in snapshot.into_iter().enumerate() {
                if callback(interp, f, item.clone(), i, receiver)?.truthy() {
                    out.push(item);
                }
            }
            JsValue::array(out)
        }
        "find" | "findIndex" => {
            let f = require_callback(args, name)?;
            let mut found = None;
            for (i, item) in snapshot.into_iter().enumerate() {
                if callback(interp, f, item.clone(), i, receiver)?.truthy() {
                    found = Some((i, item));
                    break;
                }
            }
            match (name, found) {
                ("find", Some((_, item))) => item,
                ("find", None) => JsValue::Undefined,
                (_, Some((i, _))) => JsValue::Number(i as f64),
                (_, None) => JsValue::Number(-1.0),
            }
        }
        "some" => {
            let f = require_callback(args, name)?;
            let mut any = false;
            for (i, item) in snapshot.into_iter().enumerate() {
                if callback(interp, f, item, i, receiver)?.truthy() {
                    any = true;
                    break;
                }
            }
            JsValue::Bool(any)
        }
        "every" => {
            let f = require_callback(args, name)?;
            let mut all = true;
            for (i, item) in snapshot.into_iter().enumerate() {
                if !callback(interp, f, item, i, receiver)?.truthy() {
                    all = false;
                    break;
                }
            }
            JsValue::Bool(all)
        }
        "forEach" => {
            let f = require_callback(args, name)?;
            for (i, item) in snapshot.into_iter().enumerate() {
                callback(interp, f, item, i, receiver)?;
            }
            JsValue::Undefined
        }
        "reduce" => {
            let f = require_callback(args, name)?;
            let mut iter = snapshot.into_iter().enumerate();
            let mut acc = match args.get(1) {
                Some(init) => init.clone(),
                None => match iter.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(ScriptError::type_error(
                            "Reduce of empty array with no initial value",
                        ));
                    }
                },
            };
            for (i, item) in iter {
                acc = interp.call_value(
                    f,
                    vec![acc, item, JsValue::Number(i as f64), receiver.clone()],
                    "reducer",
                )?;
            }
            acc
        }
        "join" | "toString" => {
            let sep = match (name, arg(args, 0)) {
                ("join", JsValue::Undefined) | ("toString", _) => ",".to_string(),
                (_, sep) => sep.to_js_string(),
            };
            let parts: Vec<String> = snapshot
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.to_js_string()
                    }
                })
                .collect();
            let total = parts.iter().map(String::len).sum::<usize>()
                + sep.len().saturating_mul(parts.len().saturating_sub(1));
            if total > MAX_STRING_LENGTH {
                return Err(ScriptError::invalid_string_length());
            }
            JsValue::String(parts.join(&sep))
        }
        "includes" => {
            let needle = arg(args, 0);
            JsValue::Bool(snapshot.iter().any(|v| v.same_value_zero(&needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            JsValue::Number(
                snapshot
                    .iter()
                    .position(|v| v.strict_equals(&needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
            )
        }
        "slice" => {
            let start = relative_index(&arg(args, 0), len, 0);
            let end = relative_index(&arg(args, 1), len, len);
            JsValue::array(if start < end {
                snapshot[start..end].to_vec()
            } else {
                Vec::new()
            })
        }
        "concat" => {
            let mut out = snapshot;
            for value in args {
                let extra = match value {
                    JsValue::Array(other) => other.borrow().len(),
                    _ => 1,
                };
                if out.len() + extra > MAX_ARRAY_LENGTH {
                    return Err(ScriptError::invalid_array_length());
                }
                match value {
                    JsValue::Array(other) => out.extend(other.borrow().iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            JsValue::array(out)
        }
        "push" => {
            let mut target = items.borrow_mut();
            if target.len() + args.len() > MAX_ARRAY_LENGTH {
                return Err(ScriptError::invalid_array_length());
            }
            target.extend(args.iter().cloned());
            JsValue::Number(target.len() as f64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or(JsValue::Undefined),
        "reverse" => {
            items.borrow_mut().reverse();
            receiver.clone()
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn callback(
    interp: &mut Interpreter,
    f: &JsValue,
    item: JsValue,
    index: usize,
    receiver: &JsValue,
) -> ScriptResult<JsValue> {
    interp.call_value(
        f,
        vec![item, JsValue::Number(index as f64), receiver.clone()],
        "callback",
    )
}

fn number_method(n: f64, name: &str, args: &[JsValue]) -> ScriptResult<Option<JsValue>> {
    let value = match name {
        "toFixed" => {
            let digits = number_arg(args, 0);
            let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
            if !(0.0..=100.0).contains(&digits) {
                return Err(ScriptError::Thrown(
                    "RangeError: toFixed() digits argument must be between 0 and 100".to_string(),
                ));
            }
            if n.is_finite() {
                JsValue::String(format!("{:.*}", digits as usize, n))
            } else {
                JsValue::String(number_to_string(n))
            }
        }
        "toString" => {
            let radix = match arg(args, 0) {
                JsValue::Undefined => 10,
                value => value.to_number() as u32,
            };
            if !(2..=36).contains(&radix) {
                return Err(ScriptError::Thrown(
                    "RangeError: toString() radix must be between 2 and 36".to_string(),
                ));
            }
            if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
                JsValue::String(number_to_string(n))
            } else {
                JsValue::String(integer_to_radix(n as i64, radix))
            }
        }
        "valueOf" => JsValue::Number(n),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn integer_to_radix(n: i64, radix: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    let mut rest = n.unsigned_abs();
    while rest > 0 {
        let d = (rest % radix as u64) as u32;
        digits.push(std::char::from_digit(d, radix).unwrap_or('?'));
        rest /= radix as u64;
    }
    if n < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScriptLimits;
    use crate::script::parse;
    use serde_json::{Value, json};

    fn run(body: &str) -> Value {
        let source = format!("function main() {{ {} }}", body);
        let program = parse(&source).unwrap();
        let mut interp = Interpreter::new(ScriptLimits::default());
        interp.run(&program).unwrap();
        let main = interp.global("main").unwrap();
        interp.call(&main, vec![]).unwrap().to_json().unwrap()
    }

    fn run_err(body: &str) -> ScriptError {
        let source = format!("function main() {{ {} }}", body);
        let program = parse(&source).unwrap();
        let mut interp = Interpreter::new(ScriptLimits::default());
        interp.run(&program).unwrap();
        let main = interp.global("main").unwrap();
        interp.call(&main, vec![]).unwrap_err()
    }

    #[test]
    fn test_conversions() {
        assert_eq!(
            run("return [parseFloat('3.5kg'), parseInt('42px'), parseInt('ff', 16), Number('7'), String(12), Boolean('')];"),
            json!([3.5, 42, 255, 7, "12", false])
        );
        assert_eq!(
            run("return [isNaN(parseFloat('x')), isFinite(1 / 0)];"),
            json!([true, false])
        );
    }

    #[test]
    fn test_math() {
        assert_eq!(
            run("return [Math.round(2.5), Math.round(-2.5), Math.floor(1.9), Math.max(1, 9, 3), Math.min(), Math.abs(-4)];"),
            json!([3, -2, 1, 9, null, 4])
        );
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(
            run("return ['  Hi  '.trim(), 'a,b,c'.split(','), 'abc'.toUpperCase(), 'hello'.slice(1, -1), 'hello'.substring(3, 1)];"),
            json!(["Hi", ["a", "b", "c"], "ABC", "ell", "el"])
        );
        assert_eq!(
            run("return ['5'.padStart(3, '0'), 'a-b-c'.replace('-', '+'), 'a-b-c'.replaceAll('-', ''), 'abc'.indexOf('c'), 'abc'.includes('bc')];"),
            json!(["005", "a+b-c", "abc", 2, true])
        );
    }

    #[test]
    fn test_array_methods() {
        assert_eq!(
            run("const xs = [1, 2, 3, 4]; return [xs.map(x => x * 2), xs.filter(x => x > 2), xs.reduce((a, b) => a + b, 0), xs.find(x => x > 1), xs.join('-')];"),
            json!([[2, 4, 6, 8], [3, 4], 10, 2, "1-2-3-4"])
        );
        assert_eq!(
            run("const xs = []; xs.push(1, 2); xs.push(3); return [xs.length, xs.includes(2), xs.indexOf(5), xs.some(x => x > 2), xs.every(x => x > 2)];"),
            json!([3, true, -1, true, false])
        );
    }

    #[test]
    fn test_map_passes_index() {
        assert_eq!(
            run("return ['a', 'b'].map((x, i) => x + i);"),
            json!(["a0", "b1"])
        );
    }

    #[test]
    fn test_json_and_object_helpers() {
        assert_eq!(
            run("const o = JSON.parse('{\"a\":1,\"b\":[2]}'); return [Object.keys(o), JSON.stringify(o.b), Array.isArray(o.b)];"),
            json!([["a", "b"], "[2]", true])
        );
        assert_eq!(
            run("return Object.entries({ x: 1 });"),
            json!([["x", 1]])
        );
    }

    #[test]
    fn test_number_methods() {
        assert_eq!(
            run("const n = 3.14159; return [n.toFixed(2), (255).toString(16), (10).toString()];"),
            json!(["3.14", "ff", "10"])
        );
    }

    #[test]
    fn test_unknown_method() {
        let err = run_err("const s = 'x'; return s.frobnicate();");
        assert_eq!(err.to_string(), "TypeError: s.frobnicate is not a function");
    }

    #[test]
    fn test_string_length_limits() {
        for body in [
            "return 'x'.repeat(1e19);",
            "return 'ab'.repeat(8388609);",
            "return 'x'.padStart(1e12);",
            "return 'x'.padEnd(Infinity, '-');",
        ] {
            assert_eq!(
                run_err(body),
                ScriptError::Thrown("RangeError: Invalid string length".to_string()),
                "{body}"
            );
        }
        assert_eq!(run("return ''.repeat(1e19);"), json!(""));
        assert_eq!(run("return 'ab'.repeat(3);"), json!("ababab"));

        let err = run_err("const big = 'x'.repeat(10000000); return [big, big].join('-');");
        assert_eq!(err.to_string(), "RangeError: Invalid string length");
    }

    #[test]
    fn test_array_growth_limits() {
        let err = run_err("const a = []; a.length = 600000; return a.concat(a).length;");
        assert_eq!(err, ScriptError::Thrown("RangeError: Invalid array length".to_string()));
        assert_eq!(
            run("const a = [1, 2]; return a.concat([3], 4).length;"),
            json!(4)
        );
    }

    #[test]
    fn test_replace_all_with_empty_pattern() {
        assert_eq!(run("return 'ab'.replaceAll('', '-');"), json!("-a-b-"));
        assert_eq!(run("return 'ab'.replace('', '-');"), json!("-ab"));
    }

    #[test]
    fn test_reduce_empty_array() {
        let err = run_err("return [].reduce((a, b) => a + b);");
        assert!(err.to_string().contains("Reduce of empty array"));
    }
}
