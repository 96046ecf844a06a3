use super::analysis;
use super::ast::FunctionExpr;
use super::error::{ParseError, RuntimeError};
use super::interpreter::Interpreter;
use super::lexer::is_identifier;
use super::parser::{parse_body, parse_function};
use super::value::Value;
use std::sync::Arc;

/// A parsed, immutable function of the embedded language.
///
/// Holds only syntax; every call runs in a fresh interpreter, so one
/// `Function` can be shared and called from several threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    inner: Arc<FunctionExpr>,
}

impl Function {
    /// Builds a function from parameter names and body text.
    ///
    /// # Errors
    /// * `ParseError` if a parameter is not an identifier or the body does
    ///   not parse
    pub fn new(params: &[&str], body: &str) -> Result<Self, ParseError> {
        if let Some(bad) = params.iter().find(|param| !is_identifier(param)) {
            return Err(ParseError::new(format!("Invalid parameter name '{bad}'"), 1, 1));
        }
        let body = parse_body(body)?;
        Ok(Self {
            inner: Arc::new(FunctionExpr {
                name: None,
                params: params.iter().map(|param| param.to_string()).collect(),
                rest: None,
                body,
            }),
        })
    }

    /// Parses a complete `function(params){ body }` definition.
    pub fn parse(definition: &str) -> Result<Self, ParseError> {
        Ok(Self { inner: Arc::new(parse_function(definition)?) })
    }

    pub fn params(&self) -> &[String] {
        &self.inner.params
    }

    /// Names the body uses without declaring; see [`analysis::free_names`].
    pub fn free_names(&self) -> Vec<String> {
        analysis::free_names(&self.inner)
    }

    /// Calls the function with `data` as the first argument and the `_`
    /// utility object as the second, returning the result as a string.
    pub fn call(&self, data: &serde_json::Value) -> Result<String, RuntimeError> {
        let mut interpreter = Interpreter::new();
        let globals = interpreter.globals().clone();
        let utility = globals.lookup("_").unwrap_or_default();
        let result = interpreter.call_function(&self.inner, &globals, vec![Value::from(data), utility])?;
        Ok(result.to_js_string())
    }
}
