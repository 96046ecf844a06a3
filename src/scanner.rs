//! Splits template text into literal runs and directives.
//!
//! Each step searches every enabled delimiter from the cursor and takes the
//! earliest match. When two kinds match at the same position the earlier
//! kind in [`DirectiveKind::PRIORITY`] wins.

use crate::settings::TemplateSettings;
use log::warn;
use regex::Regex;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Escape,
    Interpolate,
    Evaluate,
}

impl DirectiveKind {
    /// Order in which kinds win ties.
    pub const PRIORITY: [DirectiveKind; 3] =
        [DirectiveKind::Escape, DirectiveKind::Interpolate, DirectiveKind::Evaluate];

    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Escape => "escape",
            DirectiveKind::Interpolate => "interpolate",
            DirectiveKind::Evaluate => "evaluate",
        }
    }

    fn token(self, inner: &str) -> Token<'_> {
        match self {
            DirectiveKind::Escape => Token::Escape(inner),
            DirectiveKind::Interpolate => Token::Interpolate(inner),
            DirectiveKind::Evaluate if inner.is_empty() => Token::Evaluate(" "),
            DirectiveKind::Evaluate => Token::Evaluate(inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Literal text, already escaped for a single-quoted string literal.
    Literal(Cow<'a, str>),
    Interpolate(&'a str),
    Escape(&'a str),
    Evaluate(&'a str),
}

/// Escapes `text` for embedding between single quotes in generated source.
pub fn escape_literal(text: &str) -> Cow<'_, str> {
    let needs_escape = |c: char| matches!(c, '\\' | '\'' | '\r' | '\n' | '\t' | '\u{2028}' | '\u{2029}');
    if !text.contains(needs_escape) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

struct Found<'a> {
    kind: DirectiveKind,
    start: usize,
    end: usize,
    inner: &'a str,
}

/// Iterator over the tokens of a template.
pub struct Scanner<'a> {
    text: &'a str,
    delimiters: Vec<(DirectiveKind, &'a Regex)>,
    cursor: usize,
    pending: Option<Token<'a>>,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, settings: &'a TemplateSettings) -> Self {
        let delimiters = DirectiveKind::PRIORITY
            .into_iter()
            .filter_map(|kind| {
                let delimiter = match kind {
                    DirectiveKind::Escape => settings.escape.as_ref(),
                    DirectiveKind::Interpolate => settings.interpolate.as_ref(),
                    DirectiveKind::Evaluate => settings.evaluate.as_ref(),
                };
                delimiter.map(|d| (kind, d.regex()))
            })
            .collect();
        Self { text, delimiters, cursor: 0, pending: None, done: false }
    }

    /// First non-empty match of `regex` at or after the cursor.
    fn search(&self, kind: DirectiveKind, regex: &Regex) -> Option<Found<'a>> {
        let text = self.text;
        let mut from = self.cursor;
        while from <= text.len() {
            let captures = regex.captures_at(text, from)?;
            let whole = captures.get(0)?;
            if whole.is_empty() {
                warn!("Skipping empty {} delimiter match at byte {}", kind.name(), whole.start());
                from = whole.end() + text[whole.end()..].chars().next().map_or(1, char::len_utf8);
                continue;
            }
            let inner = captures.get(1).map_or("", |m| m.as_str());
            return Some(Found { kind, start: whole.start(), end: whole.end(), inner });
        }
        None
    }

    fn find_next(&self) -> Option<Found<'a>> {
        let mut best: Option<Found<'a>> = None;
        for &(kind, regex) in &self.delimiters {
            if let Some(found) = self.search(kind, regex) {
                if best.as_ref().is_none_or(|b| found.start < b.start) {
                    best = Some(found);
                }
            }
        }
        best
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        if self.done {
            return None;
        }

        match self.find_next() {
            Some(found) => {
                let literal = &self.text[self.cursor..found.start];
                self.cursor = found.end;
                let directive = found.kind.token(found.inner);
                if literal.is_empty() {
                    return Some(directive);
                }
                self.pending = Some(directive);
                Some(Token::Literal(escape_literal(literal)))
            }
            None => {
                self.done = true;
                let rest = &self.text[self.cursor..];
                (!rest.is_empty()).then(|| Token::Literal(escape_literal(rest)))
            }
        }
    }
}
