//! Evaluator behavior on conversion programs and typical override bodies

use api_mapping_sdk::script::{Interpreter, JsValue, ScriptError, parse};
use api_mapping_sdk::{PreviewError, PreviewExecutor, ScriptLimits, SessionConfig};
use serde_json::{Value, json};

fn convert(code: &str, sample: Value) -> Result<Value, PreviewError> {
    PreviewExecutor::default().execute(&sample, code)
}

#[test]
fn test_dispatch_table_program() {
    let code = r#"
const dispatch = {
  total: function(price, qty) { return Number(price) * qty; },
  label: function(name) { return name.trim().toUpperCase(); }
};

function convertData(data) {
  return {
    total: dispatch.total(data.price, data.qty),
    label: dispatch.label(data.name)
  };
}"#;
    let result = convert(code, json!({"price": "2.5", "qty": 4, "name": "  widget "})).unwrap();
    assert_eq!(result, json!({"total": 10, "label": "WIDGET"}));
}

#[test]
fn test_formatting_helpers() {
    let code = r#"
function convertData(data) {
  const parts = data.date.split('-');
  return {
    date: [parts[2], parts[1], parts[0]].join('/'),
    price: (data.cents / 100).toFixed(2),
    code: String(data.id).padStart(5, '0'),
    initials: data.name.split(' ').map(w => w.charAt(0)).join('')
  };
}"#;
    let result = convert(
        code,
        json!({"date": "2024-03-09", "cents": 1999, "id": 42, "name": "Ada King Lovelace"}),
    )
    .unwrap();
    assert_eq!(
        result,
        json!({"date": "09/03/2024", "price": "19.99", "code": "00042", "initials": "AKL"})
    );
}

#[test]
fn test_conditional_defaults() {
    let code = r#"
function convertData(data) {
  const status = data.active ? 'active' : 'inactive';
  let nickname = data.nickname ?? data.name;
  if (!nickname) {
    nickname = 'anonymous';
  }
  return { status, nickname, email: data.contact?.email ?? null };
}"#;
    assert_eq!(
        convert(code, json!({"active": true, "name": "ada"})).unwrap(),
        json!({"status": "active", "nickname": "ada", "email": null})
    );
    assert_eq!(
        convert(code, json!({"active": 0, "name": "", "contact": {"email": "a@b.c"}})).unwrap(),
        json!({"status": "inactive", "nickname": "anonymous", "email": "a@b.c"})
    );
}

#[test]
fn test_loops_over_nested_arrays() {
    let code = r#"
function convertData(data) {
  const items = [];
  let sum = 0;
  for (const order of data.orders) {
    items.push({ id: order.id, lines: order.lines.length });
    sum += order.lines.reduce((acc, l) => acc + l.amount, 0);
  }
  return { items, sum };
}"#;
    let sample = json!({
        "orders": [
            {"id": "o1", "lines": [{"amount": 3}, {"amount": 4}]},
            {"id": "o2", "lines": []}
        ]
    });
    assert_eq!(
        convert(code, sample).unwrap(),
        json!({"items": [{"id": "o1", "lines": 2}, {"id": "o2", "lines": 0}], "sum": 7})
    );
}

#[test]
fn test_undefined_members_are_dropped_from_output() {
    let code = "function convertData(data) { return { a: data.missing, b: [data.missing], c: 1 }; }";
    assert_eq!(
        convert(code, json!({})).unwrap(),
        json!({"b": [null], "c": 1})
    );
}

#[test]
fn test_missing_entry_point() {
    let err = convert("function convert(data) { return data; }", json!({})).unwrap_err();
    assert_eq!(
        err,
        PreviewError::Execution(ScriptError::Reference("convertData".to_string()))
    );
}

#[test]
fn test_syntax_error_is_malformed_program() {
    let err = convert("function convertData(data) { return { a: 1 ; }", json!({})).unwrap_err();
    assert!(matches!(err, PreviewError::MalformedProgram(ref e) if e.is_syntax()));
    assert!(!err.was_executed());
}

#[test]
fn test_calling_a_non_function() {
    let err = convert("function convertData(data) { return data.name(); }", json!({"name": "x"}))
        .unwrap_err();
    assert_eq!(err.to_string(), "TypeError: data.name is not a function");
}

#[test]
fn test_for_of_iterates_a_snapshot() {
    let code = r#"
function convertData(data) {
  let list = [1];
  for (const x of list) {
    list.push(x);
  }
  return {};
}"#;
    assert_eq!(convert(code, json!({})).unwrap(), json!({}));
}

#[test]
fn test_step_budget_stops_runaway_recursion() {
    let runaway = r#"
function grow(n) { return grow(n + 1) + 1; }
function convertData(data) { return { n: grow(0) }; }"#;
    let executor = PreviewExecutor::new(SessionConfig::new().with_max_call_depth(1_000).with_max_steps(300));
    let err = executor.execute(&json!({}), runaway).unwrap_err();
    assert_eq!(
        err,
        PreviewError::Execution(ScriptError::StepLimitExceeded(300))
    );
}

#[test]
fn test_scripts_cannot_see_host_state() {
    let program = parse("var leaked = typeof process + ':' + typeof require + ':' + typeof window;").unwrap();
    let mut interp = Interpreter::new(ScriptLimits::default());
    interp.run(&program).unwrap();
    assert_eq!(
        interp.global("leaked").unwrap().to_js_string(),
        "undefined:undefined:undefined"
    );
}

#[test]
fn test_calling_functions_from_the_host() {
    let program = parse("function greet(name, punct) { return 'Hi ' + name + (punct ?? '.'); }").unwrap();
    let mut interp = Interpreter::new(ScriptLimits::default());
    interp.run(&program).unwrap();
    let greet = interp.global("greet").unwrap();

    let once = interp
        .call(&greet, vec![JsValue::string("Ada")])
        .unwrap();
    assert_eq!(once.to_json().unwrap(), json!("Hi Ada."));

    let twice = interp
        .call(&greet, vec![JsValue::string("Ada"), JsValue::string("!")])
        .unwrap();
    assert_eq!(twice.to_json().unwrap(), json!("Hi Ada!"));
}

#[test]
fn test_nesting_budget_stops_deep_recursion() {
    let runaway = r#"
function grow(n) { return grow(n + 1) + 1; }
function convertData(data) { return { n: grow(0) }; }"#;
    let executor = PreviewExecutor::new(
        SessionConfig::new()
            .with_max_call_depth(1_000)
            .with_max_nesting(90),
    );
    let err = executor.execute(&json!({}), runaway).unwrap_err();
    assert_eq!(err, PreviewError::Execution(ScriptError::NestingTooDeep(90)));
    assert!(err.was_executed());
}

#[test]
fn test_index_loop_program() {
    let code = r#"
function convertData(data) {
  const rows = [];
  for (let i = 0; i < data.names.length; i++) {
    if (!data.names[i]) continue;
    rows.push({ rank: i + 1, name: data.names[i] });
  }
  return { rows };
}"#;
    assert_eq!(
        convert(code, json!({"names": ["ada", "", "grace"]})).unwrap(),
        json!({"rows": [{"rank": 1, "name": "ada"}, {"rank": 3, "name": "grace"}]})
    );
}

#[test]
fn test_interpreter_releases_closures_when_dropped() {
    let program = parse(
        "const table = { f: function(x) { return x; } }; function convertData(d) { return table.f(d); }",
    )
    .unwrap();
    let mut interp = Interpreter::new(ScriptLimits::default());
    interp.run(&program).unwrap();
    let table = interp.global("table").unwrap();
    let JsValue::Object(fields) = &table else {
        panic!("expected object");
    };
    let weak = std::rc::Rc::downgrade(fields);
    drop(table);
    drop(interp);
    assert!(weak.upgrade().is_none());
}
