//! Folds scanner tokens into the body of the template function.
//!
//! Output is appended to the accumulator through a single string literal
//! that is closed and reopened around each directive.

use crate::constants::generated::{ACCUMULATOR, SCRATCH, UTILITY};
use crate::scanner::Token;

/// Number of directives of each kind seen by a [`CodeGenerator`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveCounts {
    pub interpolate: usize,
    pub escape: usize,
    pub evaluate: usize,
}

pub struct CodeGenerator {
    source: String,
    counts: DirectiveCounts,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self { source: format!("{ACCUMULATOR}+='"), counts: DirectiveCounts::default() }
    }

    pub fn push(&mut self, token: Token<'_>) {
        match token {
            Token::Literal(text) => self.source.push_str(&text),
            Token::Interpolate(expr) => {
                self.counts.interpolate += 1;
                self.source
                    .push_str(&format!("'+\n(({SCRATCH}=({expr}))==null?'':{SCRATCH})+\n'"));
            }
            Token::Escape(expr) => {
                self.counts.escape += 1;
                self.source.push_str(&format!(
                    "'+\n(({SCRATCH}=({expr}))==null?'':{UTILITY}.escape({SCRATCH}))+\n'"
                ));
            }
            Token::Evaluate(stmt) => {
                self.counts.evaluate += 1;
                self.source.push_str(&format!("';\n{stmt}\n{ACCUMULATOR}+='"));
            }
        }
    }

    pub fn counts(&self) -> DirectiveCounts {
        self.counts
    }

    /// Closes the open string literal and returns the body.
    pub fn finish(mut self) -> String {
        self.source.push_str("';\n");
        self.source
    }
}

/// Generates the function body for a token stream.
pub fn generate<'a>(tokens: impl IntoIterator<Item = Token<'a>>) -> String {
    let mut generator = CodeGenerator::new();
    tokens.into_iter().for_each(|token| generator.push(token));
    generator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn empty_stream_yields_empty_append() {
        assert_eq!(generate(Vec::new()), "__p+='';\n");
    }

    #[test]
    fn emits_each_directive_shape() {
        let tokens = vec![
            Token::Literal(Cow::Borrowed("Hi ")),
            Token::Interpolate(" name "),
            Token::Escape(" bio "),
            Token::Evaluate(" if (x) { "),
            Token::Literal(Cow::Borrowed("!")),
            Token::Evaluate(" } "),
        ];
        let expected = concat!(
            "__p+='Hi '+\n",
            "((__t=( name ))==null?'':__t)+\n",
            "''+\n",
            "((__t=( bio ))==null?'':_.escape(__t))+\n",
            "'';\n",
            " if (x) { \n",
            "__p+='!';\n",
            " } \n",
            "__p+='';\n",
        );
        assert_eq!(generate(tokens), expected);
    }

    #[test]
    fn counts_directives() {
        let mut generator = CodeGenerator::new();
        generator.push(Token::Interpolate("a"));
        generator.push(Token::Interpolate("b"));
        generator.push(Token::Evaluate(" "));
        assert_eq!(
            generator.counts(),
            DirectiveCounts { interpolate: 2, escape: 0, evaluate: 1 }
        );
    }
}
