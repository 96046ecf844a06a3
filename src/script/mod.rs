//! A small JavaScript-shaped language used as the compile target for
//! templates.
//!
//! Generated template source is parsed into a [`Function`] and evaluated by a
//! tree-walking interpreter, in place of constructing host-language code at
//! runtime.

pub mod analysis;
pub mod ast;
mod builtins;
mod environment;
pub mod error;
mod function;
mod interpreter;
pub mod lexer;
pub mod parser;
mod stack;
pub mod value;

pub use builtins::GLOBAL_NAMES;
pub use error::{ErrorKind, ParseError, RuntimeError};
pub use function::Function;
