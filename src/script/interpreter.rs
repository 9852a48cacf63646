//! Tree-walking evaluator for parsed programs
//!
//! Each [`Interpreter`] owns a fresh global scope holding only the
//! built-ins. Evaluation is bounded by a step budget, a call depth limit
//! and a nesting limit so that a runaway script fails with an error
//! instead of hanging or exhausting the stack.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::ast::{
    AssignOp, BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, Literal, LogicalOp, Program,
    Stmt, UnaryOp, UpdateOp,
};
use super::builtins;
use super::error::{ScriptError, ScriptResult};
use super::value::{
    Callable, JsValue, MAX_ARRAY_LENGTH, MAX_STRING_LENGTH, number_to_string,
};
use crate::config::ScriptLimits;

/// Shared handle to a lexical scope
pub type Env = Rc<RefCell<Scope>>;

#[derive(Clone)]
struct Binding {
    value: JsValue,
    mutable: bool,
}

/// One level of variable bindings
pub struct Scope {
    vars: HashMap<String, Binding>,
    parent: Option<Env>,
}

impl Scope {
    fn child(parent: Option<Env>) -> Env {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent,
        }))
    }
}

pub(crate) fn declare(env: &Env, name: &str, value: JsValue, mutable: bool) {
    env.borrow_mut()
        .vars
        .insert(name.to_string(), Binding { value, mutable });
}

fn lookup(env: &Env, name: &str) -> Option<JsValue> {
    let mut current = env.clone();
    loop {
        let next = {
            let scope = current.borrow();
            if let Some(binding) = scope.vars.get(name) {
                return Some(binding.value.clone());
            }
            scope.parent.clone()
        };
        current = next?;
    }
}

fn assign(env: &Env, name: &str, value: JsValue) -> ScriptResult<()> {
    let mut current = env.clone();
    loop {
        let next = {
            let mut scope = current.borrow_mut();
            if let Some(binding) = scope.vars.get_mut(name) {
                if !binding.mutable {
                    return Err(ScriptError::type_error(format!(
                        "Assignment to constant variable '{}'",
                        name
                    )));
                }
                binding.value = value;
                return Ok(());
            }
            scope.parent.clone()
        };
        match next {
            Some(parent) => current = parent,
            None => return Err(ScriptError::Reference(name.to_string())),
        }
    }
}

enum Completion {
    Normal,
    Return(JsValue),
    Break,
    Continue,
}

/// Evaluates programs against a private global scope
///
/// Function values keep their defining scope alive, so scopes and closures
/// form reference cycles. The interpreter tracks every scope it creates and
/// empties them when dropped; values taken out of it should be converted
/// with [`JsValue::to_json`] before then.
pub struct Interpreter {
    limits: ScriptLimits,
    steps: usize,
    depth: usize,
    nesting: usize,
    globals: Env,
    scopes: Vec<Weak<RefCell<Scope>>>,
}

impl Interpreter {
    pub fn new(limits: ScriptLimits) -> Self {
        let mut interp = Self {
            limits,
            steps: 0,
            depth: 0,
            nesting: 0,
            globals: Scope::child(None),
            scopes: Vec::new(),
        };
        interp.scopes.push(Rc::downgrade(&interp.globals));
        builtins::install_globals(&interp.globals);
        interp
    }

    /// Run top-level statements, defining their bindings as globals
    pub fn run(&mut self, program: &Program) -> ScriptResult<()> {
        let globals = self.globals.clone();
        self.exec_list(&program.body, &globals)?;
        Ok(())
    }

    /// Value of a global binding
    pub fn global(&self, name: &str) -> Option<JsValue> {
        self.globals.borrow().vars.get(name).map(|b| b.value.clone())
    }

    /// Call a function value with the given arguments
    pub fn call(&mut self, function: &JsValue, args: Vec<JsValue>) -> ScriptResult<JsValue> {
        self.call_value(function, args, "value")
    }

    /// Number of evaluation steps consumed so far
    pub fn steps_used(&self) -> usize {
        self.steps
    }

    fn tick(&mut self) -> ScriptResult<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ScriptError::StepLimitExceeded(self.limits.max_steps));
        }
        Ok(())
    }

    fn enter(&mut self) -> ScriptResult<()> {
        if self.nesting >= self.limits.max_nesting {
            return Err(ScriptError::NestingTooDeep(self.limits.max_nesting));
        }
        self.nesting += 1;
        Ok(())
    }

    fn new_scope(&mut self, parent: &Env) -> Env {
        let scope = Scope::child(Some(parent.clone()));
        if self.scopes.len() == self.scopes.capacity() {
            self.scopes.retain(|s| s.strong_count() > 0);
        }
        self.scopes.push(Rc::downgrade(&scope));
        scope
    }

    /// Fresh scope for the next iteration of a `for (let ...)` loop
    fn next_iteration(&mut self, previous: &Env, parent: &Env) -> Env {
        let scope = self.new_scope(parent);
        let vars = previous.borrow().vars.clone();
        scope.borrow_mut().vars = vars;
        scope
    }

    fn hoist(&self, stmts: &[Stmt], env: &Env) {
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                if let Some(name) = &def.name {
                    declare(env, name, closure(def, env), true);
                }
            }
        }
    }

    fn exec_list(&mut self, stmts: &[Stmt], env: &Env) -> ScriptResult<Completion> {
        self.hoist(stmts, env);
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> ScriptResult<Completion> {
        self.tick()?;
        self.enter()?;
        let completion = self.exec_stmt(stmt, env);
        self.nesting -= 1;
        completion
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> ScriptResult<Completion> {
        match stmt {
            Stmt::Declare { kind, bindings } => {
                for (name, init) in bindings {
                    let value = match init {
                        Some(expr) => self.eval(expr, env)?,
                        None => JsValue::Undefined,
                    };
                    declare(env, name, value, *kind != DeclKind::Const);
                }
                Ok(Completion::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Completion::Normal),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, env)?.truthy() {
                    self.exec(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Stmt::Block(stmts) => {
                let scope = self.new_scope(env);
                self.exec_list(stmts, &scope)
            }
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            } => {
                let items = match self.eval(iterable, env)? {
                    JsValue::Array(items) => {
                        let snapshot = items.borrow().clone();
                        snapshot
                    }
                    JsValue::String(s) => s.chars().map(|c| JsValue::string(c)).collect(),
                    other => {
                        return Err(ScriptError::type_error(format!(
                            "{} is not iterable",
                            other.to_js_string()
                        )));
                    }
                };
                for item in items {
                    let scope = self.new_scope(env);
                    declare(&scope, name, item, *kind != DeclKind::Const);
                    match self.exec(body, &scope)? {
                        Completion::Break => break,
                        Completion::Normal | Completion::Continue => {}
                        done @ Completion::Return(_) => return Ok(done),
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::While { cond, body } => {
                while self.eval(cond, env)?.truthy() {
                    match self.exec(body, env)? {
                        Completion::Break => break,
                        Completion::Normal | Completion::Continue => {}
                        done @ Completion::Return(_) => return Ok(done),
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                let mut scope = self.new_scope(env);
                let per_iteration = matches!(
                    init.as_deref(),
                    Some(Stmt::Declare {
                        kind: DeclKind::Let | DeclKind::Const,
                        ..
                    })
                );
                if let Some(init) = init {
                    self.exec(init, &scope)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.eval(cond, &scope)?.truthy() {
                            break;
                        }
                    }
                    match self.exec(body, &scope)? {
                        Completion::Break => break,
                        Completion::Normal | Completion::Continue => {}
                        done @ Completion::Return(_) => return Ok(done),
                    }
                    if per_iteration {
                        scope = self.next_iteration(&scope, env);
                    }
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::Break => Ok(Completion::Break),
            Stmt::Continue => Ok(Completion::Continue),
            Stmt::Throw(expr) => {
                let value = self.eval(expr, env)?;
                Err(ScriptError::Thrown(thrown_message(&value)))
            }
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Completion::Normal)
            }
        }
    }

    fn eval(&mut self, expr: &Expr, env: &Env) -> ScriptResult<JsValue> {
        self.tick()?;
        self.enter()?;
        let value = self.eval_expr(expr, env);
        self.nesting -= 1;
        value
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Env) -> ScriptResult<JsValue> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Number(n) => JsValue::Number(*n),
                Literal::Str(s) => JsValue::string(s.clone()),
                Literal::Bool(b) => JsValue::Bool(*b),
                Literal::Null => JsValue::Null,
                Literal::Undefined => JsValue::Undefined,
            }),
            Expr::Ident(name) => {
                lookup(env, name).ok_or_else(|| ScriptError::Reference(name.clone()))
            }
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item, env)?);
                }
                Ok(JsValue::array(out))
            }
            Expr::Object(entries) => {
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.eval(value, env)?;
                    out.insert(key.clone(), value);
                }
                Ok(JsValue::object(out))
            }
            Expr::Function(def) => Ok(closure(def, env)),
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let target = self.eval(object, env)?;
                if *optional && target.is_nullish() {
                    return Ok(JsValue::Undefined);
                }
                get_property(&target, property)
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let target = self.eval(object, env)?;
                if *optional && target.is_nullish() {
                    return Ok(JsValue::Undefined);
                }
                let key = property_key(&self.eval(index, env)?);
                get_property(&target, &key)
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => self.eval_call(callee, args, *optional, env),
            Expr::New { callee, args } => {
                let args = self.eval_args(args, env)?;
                match callee.as_str() {
                    "Error" | "TypeError" | "RangeError" => {
                        let message = args
                            .first()
                            .filter(|v| !matches!(v, JsValue::Undefined))
                            .map(JsValue::to_js_string)
                            .unwrap_or_default();
                        Ok(builtins::make_error(callee, &message))
                    }
                    other => Err(ScriptError::type_error(format!(
                        "{} is not a constructor",
                        other
                    ))),
                }
            }
            Expr::Unary { op, operand } => {
                if *op == UnaryOp::Typeof {
                    if let Expr::Ident(name) = operand.as_ref() {
                        return Ok(JsValue::string(
                            lookup(env, name).map(|v| v.type_of()).unwrap_or("undefined"),
                        ));
                    }
                }
                let value = self.eval(operand, env)?;
                Ok(match op {
                    UnaryOp::Not => JsValue::Bool(!value.truthy()),
                    UnaryOp::Neg => JsValue::Number(-value.to_number()),
                    UnaryOp::Plus => JsValue::Number(value.to_number()),
                    UnaryOp::Typeof => JsValue::string(value.type_of()),
                })
            }
            Expr::Update { op, prefix, target } => {
                let old = self.eval(target, env)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.store(target, JsValue::Number(new), env)?;
                Ok(JsValue::Number(if *prefix { new } else { old }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binary_op(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, env)?.truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Assign { op, target, value } => {
                let value = match op {
                    AssignOp::Set => self.eval(value, env)?,
                    AssignOp::Add | AssignOp::Sub => {
                        let current = self.eval(target, env)?;
                        let rhs = self.eval(value, env)?;
                        let bin = if *op == AssignOp::Add {
                            BinaryOp::Add
                        } else {
                            BinaryOp::Sub
                        };
                        binary_op(bin, &current, &rhs)?
                    }
                };
                self.store(target, value.clone(), env)?;
                Ok(value)
            }
        }
    }

    fn store(&mut self, target: &Expr, value: JsValue, env: &Env) -> ScriptResult<()> {
        match target {
            Expr::Ident(name) => assign(env, name, value),
            Expr::Member {
                object, property, ..
            } => {
                let object = self.eval(object, env)?;
                set_property(&object, property, value)
            }
            Expr::Index { object, index, .. } => {
                let object = self.eval(object, env)?;
                let key = property_key(&self.eval(index, env)?);
                set_property(&object, &key, value)
            }
            _ => Err(ScriptError::syntax(0, 0, "invalid assignment target")),
        }
    }

    fn eval_args(&mut self, args: &[Expr], env: &Env) -> ScriptResult<Vec<JsValue>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            out.push(self.eval(arg, env)?);
        }
        Ok(out)
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        optional: bool,
        env: &Env,
    ) -> ScriptResult<JsValue> {
        let (receiver, name) = match callee {
            Expr::Member {
                object,
                property,
                optional: member_optional,
            } => {
                let receiver = self.eval(object, env)?;
                if *member_optional && receiver.is_nullish() {
                    return Ok(JsValue::Undefined);
                }
                (receiver, property.clone())
            }
            Expr::Index {
                object,
                index,
                optional: index_optional,
            } => {
                let receiver = self.eval(object, env)?;
                if *index_optional && receiver.is_nullish() {
                    return Ok(JsValue::Undefined);
                }
                let key = property_key(&self.eval(index, env)?);
                (receiver, key)
            }
            _ => {
                let function = self.eval(callee, env)?;
                if optional && function.is_nullish() {
                    return Ok(JsValue::Undefined);
                }
                let args = self.eval_args(args, env)?;
                return self.call_value(&function, args, &callee_name(callee));
            }
        };

        let what = callee_name(callee);
        match &receiver {
            JsValue::Undefined | JsValue::Null => Err(ScriptError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                receiver.to_js_string(),
                name
            ))),
            JsValue::Object(fields) => {
                let member = fields.borrow().get(&name).cloned();
                match member {
                    Some(function @ JsValue::Function(_)) => {
                        let args = self.eval_args(args, env)?;
                        self.call_value(&function, args, &what)
                    }
                    None | Some(JsValue::Undefined) if optional => Ok(JsValue::Undefined),
                    None if name == "hasOwnProperty" => {
                        let args = self.eval_args(args, env)?;
                        let key = args.first().map(property_key).unwrap_or_default();
                        Ok(JsValue::Bool(fields.borrow().contains_key(&key)))
                    }
                    _ => Err(ScriptError::type_error(format!("{} is not a function", what))),
                }
            }
            _ => {
                let args = self.eval_args(args, env)?;
                builtins::call_method(self, &receiver, &name, args, &what)
            }
        }
    }

    pub(crate) fn call_value(
        &mut self,
        function: &JsValue,
        args: Vec<JsValue>,
        what: &str,
    ) -> ScriptResult<JsValue> {
        let JsValue::Function(callable) = function else {
            return Err(ScriptError::type_error(format!("{} is not a function", what)));
        };
        match callable.as_ref() {
            Callable::Native(native) => builtins::call_native(*native, args),
            Callable::Closure { def, env } => self.call_closure(def, env, args),
        }
    }

    fn call_closure(
        &mut self,
        def: &FunctionDef,
        env: &Env,
        args: Vec<JsValue>,
    ) -> ScriptResult<JsValue> {
        if self.depth >= self.limits.max_call_depth {
            return Err(ScriptError::CallDepthExceeded(self.limits.max_call_depth));
        }
        let scope = self.new_scope(env);
        let mut args = args.into_iter();
        for param in &def.params {
            declare(&scope, param, args.next().unwrap_or(JsValue::Undefined), true);
        }

        self.depth += 1;
        let result = match &def.body {
            FunctionBody::Expr(expr) => self.eval(expr, &scope),
            FunctionBody::Block(stmts) => match self.exec_list(stmts, &scope) {
                Ok(Completion::Return(value)) => Ok(value),
                Ok(_) => Ok(JsValue::Undefined),
                Err(err) => Err(err),
            },
        };
        self.depth -= 1;
        result
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        for scope in self.scopes.drain(..) {
            let Some(scope) = scope.upgrade() else {
                continue;
            };
            let Ok(mut inner) = scope.try_borrow_mut() else {
                continue;
            };
            let vars = std::mem::take(&mut inner.vars);
            let parent = inner.parent.take();
            drop(inner);
            drop(vars);
            drop(parent);
        }
    }
}

fn closure(def: &Rc<FunctionDef>, env: &Env) -> JsValue {
    JsValue::Function(Rc::new(Callable::Closure {
        def: def.clone(),
        env: env.clone(),
    }))
}

/// Dotted name of a callee for error messages
fn callee_name(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", callee_name(object), property),
        Expr::Index { object, .. } => format!("{}[...]", callee_name(object)),
        Expr::Call { callee, .. } => format!("{}(...)", callee_name(callee)),
        _ => "expression".to_string(),
    }
}

/// Message carried by a thrown value
fn thrown_message(value: &JsValue) -> String {
    if let JsValue::Object(fields) = value {
        if let Some(message) = fields.borrow().get("message") {
            return message.to_js_string();
        }
    }
    value.to_js_string()
}

pub(crate) fn property_key(key: &JsValue) -> String {
    match key {
        JsValue::Number(n) => number_to_string(*n),
        other => other.to_js_string(),
    }
}

pub(crate) fn get_property(target: &JsValue, key: &str) -> ScriptResult<JsValue> {
    Ok(match target {
        JsValue::Undefined | JsValue::Null => {
            return Err(ScriptError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target.to_js_string(),
                key
            )));
        }
        JsValue::Object(fields) => fields
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or(JsValue::Undefined),
        JsValue::Array(items) => {
            let items = items.borrow();
            if key == "length" {
                JsValue::Number(items.len() as f64)
            } else {
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or(JsValue::Undefined)
            }
        }
        JsValue::String(s) => {
            if key == "length" {
                JsValue::Number(s.chars().count() as f64)
            } else {
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(JsValue::string)
                    .unwrap_or(JsValue::Undefined)
            }
        }
        JsValue::Bool(_) | JsValue::Number(_) | JsValue::Function(_) => JsValue::Undefined,
    })
}

fn set_property(target: &JsValue, key: &str, value: JsValue) -> ScriptResult<()> {
    match target {
        JsValue::Undefined | JsValue::Null => Err(ScriptError::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            target.to_js_string(),
            key
        ))),
        JsValue::Object(fields) => {
            fields.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        JsValue::Array(items) => {
            let mut items = items.borrow_mut();
            if key == "length" {
                let len = value.to_number();
                if len.is_nan() || len < 0.0 || len.fract() != 0.0 || len > MAX_ARRAY_LENGTH as f64
                {
                    return Err(ScriptError::invalid_array_length());
                }
                items.resize(len as usize, JsValue::Undefined);
            } else if let Ok(i) = key.parse::<usize>() {
                if i >= items.len() {
                    let len = i
                        .checked_add(1)
                        .filter(|len| *len <= MAX_ARRAY_LENGTH)
                        .ok_or_else(ScriptError::invalid_array_length)?;
                    items.resize(len, JsValue::Undefined);
                }
                items[i] = value;
            }
            Ok(())
        }
        // Writes to primitives are discarded
        _ => Ok(()),
    }
}

fn binary_op(op: BinaryOp, left: &JsValue, right: &JsValue) -> ScriptResult<JsValue> {
    Ok(match op {
        BinaryOp::Add => {
            let l = left.to_primitive();
            let r = right.to_primitive();
            if matches!(l, JsValue::String(_)) || matches!(r, JsValue::String(_)) {
                let (l, r) = (l.to_js_string(), r.to_js_string());
                if l.len() + r.len() > MAX_STRING_LENGTH {
                    return Err(ScriptError::invalid_string_length());
                }
                JsValue::String(l + &r)
            } else {
                JsValue::Number(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => JsValue::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => JsValue::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => JsValue::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => JsValue::Number(left.to_number() % right.to_number()),
        BinaryOp::Eq => JsValue::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => JsValue::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => JsValue::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => JsValue::Bool(!left.strict_equals(right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            JsValue::Bool(compare(op, left, right))
        }
    })
}

fn compare(op: BinaryOp, left: &JsValue, right: &JsValue) -> bool {
    let l = left.to_primitive();
    let r = right.to_primitive();
    if let (JsValue::String(a), JsValue::String(b)) = (&l, &r) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
    }
    let (a, b) = (l.to_number(), r.to_number());
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}
