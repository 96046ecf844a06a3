//! Error types for the embedded statement language.
//!
//! Constructors for the common runtime failures live here so that message
//! wording stays in one place.

use std::fmt;
use thiserror::Error;

/// A syntax error in generated or precompiled source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SyntaxError: {message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self { message: message.into(), line, column }
    }
}

/// Category of a runtime failure, named after the JavaScript error it mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An identifier could not be resolved.
    Reference,
    /// An operation was applied to a value of the wrong type.
    Type,
    /// A limit was exceeded.
    Range,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Range => "RangeError",
        };
        write!(f, "{s}")
    }
}

/// A failure raised while executing embedded statements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

pub type EvalResult<T> = Result<T, RuntimeError>;

pub fn undefined_variable(name: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::Reference, format!("{name} is not defined"))
}

pub fn constant_assignment(name: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::Type, format!("Assignment to constant variable '{name}'."))
}

pub fn already_declared(name: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::Type, format!("Identifier '{name}' has already been declared"))
}

pub fn cannot_read_property(base: &str, key: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::Type,
        format!("Cannot read properties of {base} (reading '{key}')"),
    )
}

pub fn cannot_set_property(base: &str, key: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::Type,
        format!("Cannot set properties of {base} (setting '{key}')"),
    )
}

pub fn not_callable(description: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::Type, format!("{description} is not a function"))
}

pub fn not_iterable(type_name: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::Type, format!("{type_name} is not iterable"))
}

pub fn call_stack_exceeded() -> RuntimeError {
    RuntimeError::new(ErrorKind::Range, "Maximum call stack size exceeded")
}

pub fn invalid_argument(function: &str, message: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::Range, format!("{function}: {message}"))
}

pub fn invalid_string_length() -> RuntimeError {
    RuntimeError::new(ErrorKind::Range, "Invalid string length")
}

pub fn invalid_array_length() -> RuntimeError {
    RuntimeError::new(ErrorKind::Range, "Invalid array length")
}
