//! Tree-walking evaluator.
//!
//! Semantics follow strict-mode JavaScript for the subset the parser
//! accepts: assigning an undeclared name is a `ReferenceError`, `let` and
//! `const` are block scoped, `var` and function declarations are hoisted to
//! the enclosing function.

use super::analysis::hoisted_names;
use super::ast::{AssignOp, BinaryOp, DeclKind, Expr, ForBinding, FunctionExpr, LogicalOp, Stmt, UnaryOp};
use super::builtins;
use super::environment::{AssignError, Env, ScopeKind};
use super::error::{
    already_declared, call_stack_exceeded, cannot_read_property, cannot_set_property,
    constant_assignment, invalid_array_length, invalid_string_length, not_callable,
    not_iterable, undefined_variable, EvalResult, RuntimeError,
};
use super::stack::ensure_sufficient_stack;
use super::value::{Callable, Value};
use crate::constants::limits::{
    MAX_ARRAY_ELEMENTS, MAX_ARRAY_LENGTH, MAX_CALL_DEPTH, MAX_STRING_LENGTH,
};
use log::trace;
use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;

/// How a statement completed.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// An assignment target with its object and key already evaluated.
enum Place<'a> {
    Name(&'a str),
    Property { base: Value, key: String },
}

pub struct Interpreter {
    globals: Env,
    depth: usize,
    /// Scopes captured by closures; cleared on drop to break `Rc` cycles.
    captured: Vec<Env>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        for env in self.captured.drain(..) {
            env.clear_chain();
        }
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self { globals: builtins::globals(), depth: 0, captured: Vec::new() }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// Invokes a parsed function with `parent` as its enclosing scope.
    pub fn call_function(
        &mut self,
        function: &FunctionExpr,
        parent: &Env,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(call_stack_exceeded());
        }
        let scope = parent.child(ScopeKind::Function);
        let mut args = args.into_iter();
        for param in &function.params {
            scope.define(param, args.next().unwrap_or_default(), true);
        }
        if let Some(rest) = &function.rest {
            scope.define(rest, Value::array(args.collect()), true);
        }
        for name in hoisted_names(&function.body) {
            scope.declare_var(&name);
        }
        for stmt in &function.body {
            if let Stmt::Function(declaration) = stmt {
                self.declare_function(declaration, &scope)?;
            }
        }

        self.depth += 1;
        let flow = self.exec_block(&function.body, &scope);
        self.depth -= 1;
        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    /// Calls any callable value.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        let Value::Function(callable) = callee else {
            return Err(not_callable(&callee.to_js_string()));
        };
        match &**callable {
            Callable::Closure { function, env } => self.call_function(function, env, args),
            Callable::Native { call, .. } => call(self, &args),
        }
    }

    fn closure(&mut self, function: &Arc<FunctionExpr>, env: &Env) -> Value {
        self.captured.push(env.clone());
        Value::Function(Rc::new(Callable::Closure { function: function.clone(), env: env.clone() }))
    }

    fn declare_function(&mut self, function: &Arc<FunctionExpr>, env: &Env) -> EvalResult<()> {
        let closure = self.closure(function, env);
        let name = function.name.as_deref().unwrap_or_default();
        env.declare_var(name);
        self.assign_name(env, name, closure)
    }

    fn assign_name(&mut self, env: &Env, name: &str, value: Value) -> EvalResult<()> {
        env.assign(name, value).map_err(|error| match error {
            AssignError::Undefined => undefined_variable(name),
            AssignError::Immutable => constant_assignment(name),
        })
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> EvalResult<Flow> {
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> EvalResult<Flow> {
        ensure_sufficient_stack(|| self.exec_stmt(stmt, env))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
            }
            Stmt::Declare { kind, decls } => {
                for (name, init) in decls {
                    let value = match init {
                        Some(init) => Some(self.eval(init, env)?),
                        None => None,
                    };
                    match kind {
                        DeclKind::Var => {
                            env.declare_var(name);
                            if let Some(value) = value {
                                self.assign_name(env, name, value)?;
                            }
                        }
                        DeclKind::Let | DeclKind::Const => {
                            let value = value.unwrap_or_default();
                            if !env.declare(name, value, *kind == DeclKind::Let) {
                                return Err(already_declared(name));
                            }
                        }
                    }
                }
            }
            Stmt::Function(function) => self.declare_function(function, env)?,
            Stmt::Block(stmts) => return self.exec_block(stmts, &env.child(ScopeKind::Block)),
            Stmt::If { test, consequent, alternate } => {
                if self.eval(test, env)?.truthy() {
                    return self.exec(consequent, env);
                }
                if let Some(alternate) = alternate {
                    return self.exec(alternate, env);
                }
            }
            Stmt::For { init, test, update, body } => {
                let scope = env.child(ScopeKind::Block);
                if let Some(init) = init {
                    self.exec(init, &scope)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, &scope)?.truthy() {
                            break;
                        }
                    }
                    match self.exec(body, &scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
            }
            Stmt::ForIn { binding, object, body } => {
                let keys = match self.eval(object, env)? {
                    Value::Object(map) => map.borrow().keys().map(|key| Value::string(key.as_str())).collect(),
                    Value::Array(items) => {
                        (0..items.borrow().len()).map(|i| Value::string(i.to_string())).collect()
                    }
                    Value::String(s) => {
                        (0..s.chars().count()).map(|i| Value::string(i.to_string())).collect()
                    }
                    _ => Vec::new(),
                };
                return self.iterate(binding, keys, body, env);
            }
            Stmt::ForOf { binding, iterable, body } => {
                let items = match self.eval(iterable, env)? {
                    Value::Array(items) => items.borrow().clone(),
                    Value::String(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
                    other => return Err(not_iterable(&describe_value(&other))),
                };
                return self.iterate(binding, items, body, env);
            }
            Stmt::While { test, body } => {
                while self.eval(test, env)?.truthy() {
                    match self.exec(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Empty => {}
        }
        Ok(Flow::Normal)
    }

    /// Runs `body` once per item, binding the item as `for-in`/`for-of` do.
    fn iterate(
        &mut self,
        binding: &ForBinding,
        items: Vec<Value>,
        body: &Stmt,
        env: &Env,
    ) -> EvalResult<Flow> {
        for item in items {
            let scope = match binding.kind {
                Some(kind @ (DeclKind::Let | DeclKind::Const)) => {
                    let scope = env.child(ScopeKind::Block);
                    scope.define(&binding.name, item, kind == DeclKind::Let);
                    scope
                }
                Some(DeclKind::Var) => {
                    env.declare_var(&binding.name);
                    self.assign_name(env, &binding.name, item)?;
                    env.clone()
                }
                None => {
                    self.assign_name(env, &binding.name, item)?;
                    env.clone()
                }
            };
            match self.exec(body, &scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    fn eval(&mut self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        ensure_sufficient_stack(|| self.eval_expr(expr, env))
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::string(s.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident(name) => env.lookup(name).ok_or_else(|| undefined_variable(name)),
            Expr::Array(items) => {
                let items = items.iter().map(|item| self.eval(item, env)).collect::<EvalResult<_>>()?;
                Ok(Value::array(items))
            }
            Expr::Object(props) => {
                let mut map = super::value::ObjectMap::new();
                for (key, value) in props {
                    let value = self.eval(value, env)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::object(map))
            }
            Expr::Function(function) => Ok(self.function_expression(function, env)),
            Expr::Member { object, property } => {
                let base = self.eval(object, env)?;
                get_property(&base, property)
            }
            Expr::Index { object, index } => {
                let base = self.eval(object, env)?;
                let key = self.eval(index, env)?.to_property_key();
                get_property(&base, &key)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, env),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand, env),
            Expr::Update { increment, prefix, target } => {
                let place = self.place(target, env)?;
                let old = read(&place, env)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.write(place, Value::Number(new), env)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binary(*op, &left, &right)
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
            Expr::Conditional { test, consequent, alternate } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            Expr::Assign { op, target, value } => {
                let place = self.place(target, env)?;
                let value = match op {
                    AssignOp::Assign => self.eval(value, env)?,
                    AssignOp::Compound(op) => {
                        let current = read(&place, env)?;
                        let rhs = self.eval(value, env)?;
                        binary(*op, &current, &rhs)?
                    }
                };
                self.write(place, value.clone(), env)?;
                Ok(value)
            }
        }
    }

    /// A named function expression sees its own name in a scope of its own.
    fn function_expression(&mut self, function: &Arc<FunctionExpr>, env: &Env) -> Value {
        match &function.name {
            Some(name) => {
                let scope = env.child(ScopeKind::Block);
                let closure = self.closure(function, &scope);
                scope.define(name, closure.clone(), false);
                closure
            }
            None => self.closure(function, env),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Env) -> EvalResult<Value> {
        if op == UnaryOp::Typeof {
            if let Expr::Ident(name) = operand {
                let type_name = env.lookup(name).map_or("undefined", |value| value.type_of());
                return Ok(Value::string(type_name));
            }
        }
        let value = self.eval(operand, env)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Typeof => Value::string(value.type_of()),
        })
    }

    fn eval_args(&mut self, args: &[Expr], env: &Env) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], env: &Env) -> EvalResult<Value> {
        let (receiver, method) = match callee {
            Expr::Member { object, property } => (self.eval(object, env)?, property.clone()),
            Expr::Index { object, index } => {
                let receiver = self.eval(object, env)?;
                (receiver, self.eval(index, env)?.to_property_key())
            }
            _ => {
                let function = self.eval(callee, env)?;
                let args = self.eval_args(args, env)?;
                if !matches!(function, Value::Function(_)) {
                    return Err(not_callable(&describe(callee)));
                }
                return self.call(&function, args);
            }
        };

        let args = self.eval_args(args, env)?;
        if let Some(result) = builtins::call_method(self, &receiver, &method, &args)? {
            return Ok(result);
        }
        let function = get_property(&receiver, &method)?;
        if !matches!(function, Value::Function(_)) {
            return Err(not_callable(&describe(callee)));
        }
        trace!("calling method '{method}'");
        self.call(&function, args)
    }

    /// Evaluates the object and key of an assignment target exactly once.
    fn place<'a>(&mut self, target: &'a Expr, env: &Env) -> EvalResult<Place<'a>> {
        match target {
            Expr::Ident(name) => Ok(Place::Name(name)),
            Expr::Member { object, property } => {
                let base = self.eval(object, env)?;
                Ok(Place::Property { base, key: property.clone() })
            }
            Expr::Index { object, index } => {
                let base = self.eval(object, env)?;
                let key = self.eval(index, env)?.to_property_key();
                Ok(Place::Property { base, key })
            }
            _ => Err(RuntimeError::new(
                super::error::ErrorKind::Reference,
                "Invalid left-hand side in assignment",
            )),
        }
    }

    fn write(&mut self, place: Place<'_>, value: Value, env: &Env) -> EvalResult<()> {
        match place {
            Place::Name(name) => self.assign_name(env, name, value),
            Place::Property { base, key } => set_property(&base, &key, value),
        }
    }
}

fn read(place: &Place<'_>, env: &Env) -> EvalResult<Value> {
    match place {
        Place::Name(name) => env.lookup(name).ok_or_else(|| undefined_variable(name)),
        Place::Property { base, key } => get_property(base, key),
    }
}

/// Parses `key` as a canonical array index (`"0"`, `"12"`, but not `"01"`).
fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

fn get_property(base: &Value, key: &str) -> EvalResult<Value> {
    Ok(match base {
        Value::Undefined | Value::Null => {
            return Err(cannot_read_property(&base.to_js_string(), key));
        }
        Value::Object(map) => map.borrow().get(key).cloned().unwrap_or_default(),
        Value::Array(items) => {
            let items = items.borrow();
            if key == "length" {
                Value::Number(items.len() as f64)
            } else {
                array_index(key).and_then(|i| items.get(i).cloned()).unwrap_or_default()
            }
        }
        Value::String(s) => {
            if key == "length" {
                Value::Number(s.chars().count() as f64)
            } else {
                array_index(key)
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::string(c.to_string()))
                    .unwrap_or_default()
            }
        }
        Value::Bool(_) | Value::Number(_) | Value::Function(_) => Value::Undefined,
    })
}

fn set_property(base: &Value, key: &str, value: Value) -> EvalResult<()> {
    match base {
        Value::Undefined | Value::Null => {
            return Err(cannot_set_property(&base.to_js_string(), key));
        }
        Value::Object(map) => {
            map.borrow_mut().insert(key.to_string(), value);
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if let Some(index) = array_index(key) {
                if index >= items.len() {
                    if index >= MAX_ARRAY_ELEMENTS {
                        return Err(invalid_array_length());
                    }
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
            } else if key == "length" {
                let len = value.to_number();
                if !(0.0..=MAX_ARRAY_LENGTH).contains(&len) || len.fract() != 0.0 {
                    return Err(invalid_array_length());
                }
                let len = len as usize;
                if len > MAX_ARRAY_ELEMENTS {
                    return Err(invalid_array_length());
                }
                items.resize(len, Value::Undefined);
            }
        }
        _ => {}
    }
    Ok(())
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    Ok(match op {
        BinaryOp::Add => {
            let (left, right) = (left.to_primitive(), right.to_primitive());
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                let (left, right) = (left.to_js_string(), right.to_js_string());
                if left.len() + right.len() > MAX_STRING_LENGTH {
                    return Err(invalid_string_length());
                }
                Value::string(left + &right)
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::LtEq => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::GtEq => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    })
}

/// Relational comparison; `None` when either side is NaN.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    let (left, right) = (left.to_primitive(), right.to_primitive());
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Some(a.cmp(b));
    }
    left.to_number().partial_cmp(&right.to_number())
}

/// Source-like text of a callee, for error messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member { object, property } => format!("{}.{property}", describe(object)),
        Expr::Index { object, .. } => format!("{}[...]", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) => value.to_js_string(),
        Value::String(s) => format!("\"{s}\""),
        other => other.type_of().to_string(),
    }
}
