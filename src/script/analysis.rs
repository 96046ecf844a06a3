//! Static passes over parsed functions: `var` hoisting and free-name discovery.

use super::ast::{DeclKind, Expr, ForBinding, FunctionExpr, Stmt};
use super::builtins::GLOBAL_NAMES;
use super::stack::ensure_sufficient_stack;
use indexmap::IndexSet;
use std::collections::HashSet;

/// Names bound by `var` declarations, `var` loop bindings and function
/// declarations anywhere in `body`, not descending into nested functions.
pub fn hoisted_names(body: &[Stmt]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in body {
        collect_hoisted(stmt, &mut names);
    }
    names
}

fn collect_hoisted(stmt: &Stmt, names: &mut Vec<String>) {
    match stmt {
        Stmt::Declare { kind: DeclKind::Var, decls } => {
            names.extend(decls.iter().map(|(name, _)| name.clone()));
        }
        Stmt::Function(function) => names.extend(function.name.clone()),
        Stmt::Block(stmts) => stmts.iter().for_each(|s| collect_hoisted(s, names)),
        Stmt::If { consequent, alternate, .. } => {
            collect_hoisted(consequent, names);
            if let Some(alternate) = alternate {
                collect_hoisted(alternate, names);
            }
        }
        Stmt::For { init, body, .. } => {
            if let Some(init) = init {
                collect_hoisted(init, names);
            }
            collect_hoisted(body, names);
        }
        Stmt::ForIn { binding, body, .. } | Stmt::ForOf { binding, body, .. } => {
            if binding.kind == Some(DeclKind::Var) {
                names.push(binding.name.clone());
            }
            collect_hoisted(body, names);
        }
        Stmt::While { body, .. } => collect_hoisted(body, names),
        _ => {}
    }
}

/// Identifiers read or written by `function` that no enclosing declaration
/// binds and that are not globals, in order of first appearance.
pub fn free_names(function: &FunctionExpr) -> Vec<String> {
    let mut resolver = Resolver::default();
    resolver.function(function);
    resolver.free.into_iter().collect()
}

/// `let` and `const` names declared directly in `stmts`.
fn lexical_names(stmts: &[Stmt]) -> HashSet<String> {
    stmts
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Declare { kind: DeclKind::Let | DeclKind::Const, decls } => Some(decls),
            _ => None,
        })
        .flat_map(|decls| decls.iter().map(|(name, _)| name.clone()))
        .collect()
}

#[derive(Default)]
struct Resolver {
    scopes: Vec<HashSet<String>>,
    free: IndexSet<String>,
}

impl Resolver {
    fn function(&mut self, function: &FunctionExpr) {
        let mut declared = lexical_names(&function.body);
        declared.extend(function.params.iter().cloned());
        declared.extend(function.rest.clone());
        declared.extend(function.name.clone());
        declared.extend(hoisted_names(&function.body));
        self.scoped(declared, |resolver| {
            for stmt in &function.body {
                resolver.stmt(stmt);
            }
        });
    }

    fn scoped(&mut self, declared: HashSet<String>, visit: impl FnOnce(&mut Self)) {
        self.scopes.push(declared);
        visit(self);
        self.scopes.pop();
    }

    fn reference(&mut self, name: &str) {
        if GLOBAL_NAMES.contains(&name) || self.scopes.iter().any(|scope| scope.contains(name)) {
            return;
        }
        self.free.insert(name.to_string());
    }

    /// Scope holding a `let`/`const` loop binding; empty for other bindings.
    fn loop_scope(binding: &ForBinding) -> HashSet<String> {
        match binding.kind {
            Some(DeclKind::Let | DeclKind::Const) => HashSet::from([binding.name.clone()]),
            _ => HashSet::new(),
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.visit_stmt(stmt));
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Declare { decls, .. } => {
                for (_, init) in decls {
                    if let Some(init) = init {
                        self.expr(init);
                    }
                }
            }
            Stmt::Function(function) => self.function(function),
            Stmt::Block(stmts) => self.scoped(lexical_names(stmts), |resolver| {
                stmts.iter().for_each(|s| resolver.stmt(s));
            }),
            Stmt::If { test, consequent, alternate } => {
                self.expr(test);
                self.stmt(consequent);
                if let Some(alternate) = alternate {
                    self.stmt(alternate);
                }
            }
            Stmt::For { init, test, update, body } => {
                let declared = match init.as_deref() {
                    Some(init) => lexical_names(std::slice::from_ref(init)),
                    None => HashSet::new(),
                };
                self.scoped(declared, |resolver| {
                    if let Some(init) = init {
                        resolver.stmt(init);
                    }
                    if let Some(test) = test {
                        resolver.expr(test);
                    }
                    if let Some(update) = update {
                        resolver.expr(update);
                    }
                    resolver.stmt(body);
                });
            }
            Stmt::ForIn { binding, object: subject, body }
            | Stmt::ForOf { binding, iterable: subject, body } => {
                if binding.kind.is_none() {
                    self.reference(&binding.name);
                }
                self.expr(subject);
                self.scoped(Self::loop_scope(binding), |resolver| resolver.stmt(body));
            }
            Stmt::While { test, body } => {
                self.expr(test);
                self.stmt(body);
            }
            Stmt::Return(Some(expr)) => self.expr(expr),
            Stmt::Return(None) | Stmt::Break | Stmt::Continue | Stmt::Empty => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.visit_expr(expr));
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Null => {}
            Expr::Ident(name) => self.reference(name),
            Expr::Array(items) => items.iter().for_each(|item| self.expr(item)),
            Expr::Object(props) => props.iter().for_each(|(_, value)| self.expr(value)),
            Expr::Function(function) => self.function(function),
            Expr::Member { object, .. } => self.expr(object),
            Expr::Index { object, index } => {
                self.expr(object);
                self.expr(index);
            }
            Expr::Call { callee, args } => {
                self.expr(callee);
                args.iter().for_each(|arg| self.expr(arg));
            }
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Update { target, .. } => self.expr(target),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::Conditional { test, consequent, alternate } => {
                self.expr(test);
                self.expr(consequent);
                self.expr(alternate);
            }
            Expr::Assign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::{parse_body, parse_function};

    fn free(body: &str) -> Vec<String> {
        let function = FunctionExpr {
            name: None,
            params: vec!["obj".to_string(), "_".to_string()],
            rest: None,
            body: parse_body(body).unwrap(),
        };
        free_names(&function)
    }

    #[test]
    fn finds_names_in_first_appearance_order() {
        assert_eq!(free("__p += name + title + name;"), vec!["__p", "name", "title"]);
    }

    #[test]
    fn skips_declared_params_and_globals() {
        let names = free("var __p = ''; for (var i = 0; i < people.length; i++) { __p += _.escape(String(people[i])); }");
        assert_eq!(names, vec!["people"]);
    }

    #[test]
    fn closures_see_outer_declarations() {
        let names = free("var __p=''; _.each(people, function(person, i) { __p += person + i + sep; });");
        assert_eq!(names, vec!["people", "sep"]);
    }

    #[test]
    fn member_names_are_not_free() {
        assert_eq!(free("x.y.z; a[b];"), vec!["x", "a", "b"]);
    }

    #[test]
    fn bare_loop_bindings_are_references() {
        assert_eq!(free("for (key in list) {} for (let k in list) {}"), vec!["key", "list"]);
    }

    #[test]
    fn block_scoped_declarations_do_not_hide_outer_names() {
        assert_eq!(free("if (flag) { let name = 'inner'; name; } name;"), vec!["flag", "name"]);
        assert_eq!(free("{ const n = 1; } for (let i = 0; i < n; i++) {} i;"), vec!["n", "i"]);
        assert_eq!(free("for (const item of list) { item; } item;"), vec!["list", "item"]);
        assert!(free("let top = 1; { top; }").is_empty());
        assert_eq!(free("if (a) { var hoisted = 1; } hoisted;"), vec!["a"]);
    }

    #[test]
    fn hoists_vars_from_nested_blocks() {
        let body = parse_body(
            "if (a) { var x = 1; } for (var i of xs) { let y = 2; } function f() { var inner; }",
        )
        .unwrap();
        assert_eq!(hoisted_names(&body), vec!["x", "i", "f"]);
    }

    #[test]
    fn named_function_expressions_bind_their_name() {
        let function = parse_function("function outer(n) { return (function fact(k) { return k ? k * fact(k - 1) : 1; })(n); }").unwrap();
        assert!(free_names(&function).is_empty());
    }
}
