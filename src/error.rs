use crate::script::{ParseError, RuntimeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON. Original error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse YAML. Original error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The configured `variable` would not be safe to splice into generated source.
    #[error("variable is not a bare identifier: {variable}")]
    InvalidVariable { variable: String },

    /// A delimiter pattern is not a usable regular expression.
    #[error("Invalid {name} delimiter '{pattern}': {reason}.")]
    InvalidDelimiter { name: String, pattern: String, reason: String },

    /// The generated source could not be built into a function.
    ///
    /// `generated` holds the full source text that was handed to the parser.
    #[error("Failed to build template function: {error}")]
    GenerationError {
        #[source]
        error: ParseError,
        generated: String,
    },

    /// An embedded statement failed while rendering.
    #[error("Render error: {0}")]
    RenderError(#[from] RuntimeError),

    #[error("Unsupported settings file '{path}'. Expected one of: {extensions}.")]
    UnsupportedSettingsFormat { path: String, extensions: String },

    #[error("Cannot read both the template and the data from stdin.")]
    StdinConflict,
}

impl Error {
    /// The generated source attached to a [`Error::GenerationError`].
    pub fn generated_source(&self) -> Option<&str> {
        match self {
            Error::GenerationError { generated, .. } => Some(generated),
            _ => None,
        }
    }
}

/// Convenience type alias for Results with the crate error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    if let Some(generated) = err.generated_source() {
        eprintln!("Generated source:\n{generated}");
    }
    std::process::exit(crate::constants::exit_codes::FAILURE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_variable_names_the_value() {
        let err = Error::InvalidVariable { variable: "a); alert(1".to_string() };
        assert_eq!(err.to_string(), "variable is not a bare identifier: a); alert(1");
        assert!(err.generated_source().is_none());
    }

    #[test]
    fn generation_error_exposes_source() {
        let err = Error::GenerationError {
            error: ParseError::new("Unexpected end of input", 3, 1),
            generated: "__p+='';\nif (x) {\n".to_string(),
        };
        assert_eq!(err.generated_source(), Some("__p+='';\nif (x) {\n"));
        assert!(err.to_string().contains("Unexpected end of input"));
    }
}
