//! Lexical scope chain for the interpreter.
//!
//! Scopes are reference counted so that closures can keep their defining
//! scope alive. A scope is either a function scope (target of `var`
//! hoisting) or a block scope (home of `let`/`const`).

use super::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Block,
}

/// Error returned by [`Env::assign`] when assignment fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    /// Variable exists but was declared `const`.
    Immutable,
    /// Variable not found in any scope.
    Undefined,
}

struct Binding {
    value: Value,
    mutable: bool,
}

struct Scope {
    vars: HashMap<String, Binding>,
    parent: Option<Env>,
    kind: ScopeKind,
}

#[derive(Clone)]
pub struct Env(Rc<RefCell<Scope>>);

impl Env {
    /// A scope with no parent; holds the globals.
    pub fn root() -> Self {
        Env(Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: None,
            kind: ScopeKind::Function,
        })))
    }

    pub fn child(&self, kind: ScopeKind) -> Self {
        Env(Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: Some(self.clone()),
            kind,
        })))
    }

    fn parent(&self) -> Option<Env> {
        self.0.borrow().parent.clone()
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            if let Some(binding) = current.0.borrow().vars.get(name) {
                return Some(binding.value.clone());
            }
            current = current.parent()?;
        }
    }

    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            if let Some(binding) = current.0.borrow_mut().vars.get_mut(name) {
                if !binding.mutable {
                    return Err(AssignError::Immutable);
                }
                binding.value = value;
                return Ok(());
            }
            current = current.parent().ok_or(AssignError::Undefined)?;
        }
    }

    /// Binds `name` in this scope, replacing any previous binding.
    pub fn define(&self, name: &str, value: Value, mutable: bool) {
        self.0.borrow_mut().vars.insert(name.to_string(), Binding { value, mutable });
    }

    /// `let`/`const`: binds in this scope unless the name is already taken here.
    pub fn declare(&self, name: &str, value: Value, mutable: bool) -> bool {
        let mut scope = self.0.borrow_mut();
        if scope.vars.contains_key(name) {
            return false;
        }
        scope.vars.insert(name.to_string(), Binding { value, mutable });
        true
    }

    /// `var`: binds `undefined` in the nearest function scope if absent there.
    pub fn declare_var(&self, name: &str) {
        let mut current = self.clone();
        while current.0.borrow().kind != ScopeKind::Function {
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
            .0
            .borrow_mut()
            .vars
            .entry(name.to_string())
            .or_insert(Binding { value: Value::Undefined, mutable: true });
    }

    /// Drops every binding in this scope and its ancestors.
    ///
    /// Closures stored in a scope they capture form `Rc` cycles; clearing the
    /// chain once a render finishes releases them.
    pub fn clear_chain(&self) {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let vars = std::mem::take(&mut env.0.borrow_mut().vars);
            current = env.parent();
            drop(vars);
        }
    }
}
