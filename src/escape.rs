//! HTML escaping for the `<%- %>` interpolation kind.

use std::borrow::Cow;

/// Characters that are unsafe inside HTML, paired with their entities.
pub const HTML_ESCAPES: [(char, &str); 6] = [
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#x27;"),
    ('`', "&#x60;"),
];

/// Returns the entity for one of the six HTML-unsafe characters.
///
/// Any other character has no entity and yields `None`.
pub fn escape_char(c: char) -> Option<&'static str> {
    HTML_ESCAPES.iter().find(|(unsafe_char, _)| *unsafe_char == c).map(|(_, entity)| *entity)
}

/// Replaces every HTML-unsafe character in `input` with its entity.
///
/// Borrows the input when nothing needs escaping.
///
/// # Examples
/// ```
/// use microtemplate::escape::escape_html;
///
/// assert_eq!(escape_html("<b>Curly & 'Moe'</b>"), "&lt;b&gt;Curly &amp; &#x27;Moe&#x27;&lt;/b&gt;");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.chars().any(|c| escape_char(c).is_some()) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match escape_char(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Inverse of [`escape_html`]: turns the six entities back into characters.
///
/// Unknown entities are left untouched.
pub fn unescape_html(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut unescaped = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find('&') {
        unescaped.push_str(&rest[..at]);
        rest = &rest[at..];
        match HTML_ESCAPES.iter().find(|(_, entity)| rest.starts_with(entity)) {
            Some((c, entity)) => {
                unescaped.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                unescaped.push('&');
                rest = &rest[1..];
            }
        }
    }
    unescaped.push_str(rest);
    Cow::Owned(unescaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_unsafe_character() {
        assert_eq!(escape_char('&'), Some("&amp;"));
        assert_eq!(escape_char('<'), Some("&lt;"));
        assert_eq!(escape_char('>'), Some("&gt;"));
        assert_eq!(escape_char('"'), Some("&quot;"));
        assert_eq!(escape_char('\''), Some("&#x27;"));
        assert_eq!(escape_char('`'), Some("&#x60;"));
        assert_eq!(escape_char('a'), None);
        assert_eq!(escape_char('/'), None);
    }

    #[test]
    fn escapes_only_unsafe_characters() {
        assert_eq!(escape_html("Curly & Moe"), "Curly &amp; Moe");
        assert_eq!(escape_html("`a` \"b\" 'c'"), "&#x60;a&#x60; &quot;b&quot; &#x27;c&#x27;");
        assert_eq!(escape_html("caf\u{e9} / 100%"), "caf\u{e9} / 100%");
        assert!(matches!(escape_html("nothing to do"), Cow::Borrowed(_)));
    }

    #[test]
    fn unescape_inverts_escape() {
        let raw = "<a href=\"x\">Tom & 'Jerry' `quoted`</a>";
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }

    #[test]
    fn unescape_keeps_unknown_entities() {
        assert_eq!(unescape_html("&nbsp;&amp;&"), "&nbsp;&&");
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }
}
