//! Sandboxed evaluator for generated transformation code
//!
//! Generated programs are written in a small subset of JavaScript:
//! function declarations and expressions, arrow functions, `const`/`let`,
//! `if`/`else`, `for...of`, classic `for` and `while` loops with `break`
//! and `continue`, `throw`, object and array literals, and the operators
//! commonly used in field transforms including `++` and `--`. Built-ins cover
//! `parseFloat`, `parseInt`, `String`, `Number`, `Boolean`, `Math`, `JSON`,
//! `Object.keys`/`values`/`entries`, `Array.isArray` and the usual string,
//! array and number methods.
//!
//! # Example
//!
//! ```rust
//! use api_mapping_sdk::config::ScriptLimits;
//! use api_mapping_sdk::script::{Interpreter, JsValue, parse};
//!
//! let program = parse("function double(x) { return x * 2; }").unwrap();
//! let mut interp = Interpreter::new(ScriptLimits::default());
//! interp.run(&program).unwrap();
//! let double = interp.global("double").unwrap();
//! let result = interp.call(&double, vec![JsValue::Number(21.0)]).unwrap();
//! assert_eq!(result.to_number(), 42.0);
//! ```

pub mod ast;
mod builtins;
pub mod error;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::Program;
pub use error::{ScriptError, ScriptResult};
pub use interpreter::{Env, Interpreter, Scope};
pub use parser::parse;
pub use value::JsValue;
