/// Handles argument parsing and the command-line workflow.
pub mod cli;

/// Turns template text into a compiled [`Template`].
pub mod compiler;

/// Generates the template function body from scanner tokens.
pub mod codegen;

/// Default delimiters, reserved names and limits.
pub mod constants;

/// Defines custom error types.
pub mod error;

/// HTML escaping and unescaping.
pub mod escape;

/// Guards the configured data variable name.
pub mod identifier;

/// A set of helpers for working with the file system.
pub mod ioutils;

/// Splits template text into literals and directives.
pub mod scanner;

/// The language template functions are written in.
pub mod script;

/// Delimiter configuration.
pub mod settings;

/// Compiled templates and one-shot rendering.
pub mod template;

pub use compiler::compile;
pub use error::{Error, Result};
pub use settings::{Delimiter, TemplateSettings};
pub use template::{render, Template};
