//! Guard for the configured data variable name.
//!
//! The `variable` setting is spliced verbatim into the generated function
//! header, so it is checked against a permissive identifier pattern first.
//! The pattern accepts more than a strict identifier grammar (leading digits,
//! surrounding whitespace) but rejects anything that could close the
//! parameter list or introduce a second token.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static BARE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w|\$)+\s*$").expect("bare identifier pattern is valid")
});

/// Whether `candidate` may be used as the data parameter name.
pub fn is_bare_identifier(candidate: &str) -> bool {
    BARE_IDENTIFIER.is_match(candidate)
}

/// Validates the configured variable and returns it without surrounding whitespace.
///
/// # Errors
/// * `Error::InvalidVariable` naming the rejected value
pub fn validate_variable(candidate: &str) -> Result<&str> {
    if !is_bare_identifier(candidate) {
        return Err(Error::InvalidVariable { variable: candidate.to_string() });
    }
    Ok(candidate.trim())
}
