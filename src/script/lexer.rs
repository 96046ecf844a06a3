//! Tokenizer for the embedded statement language.
//!
//! Produces the whole token vector up front; the parser needs two tokens of
//! lookahead for `for (x in ...)` headers and nothing more. Newlines are
//! skipped but remembered on the following token so the parser can apply
//! automatic semicolon insertion.

use super::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Var,
    Let,
    Const,
    If,
    Else,
    For,
    In,
    While,
    Break,
    Continue,
    Return,
    Function,
    True,
    False,
    Null,
    Typeof,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        let keyword = match ident {
            "var" => Keyword::Var,
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "while" => Keyword::While,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "return" => Keyword::Return,
            "function" => Keyword::Function,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "typeof" => Keyword::Typeof,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Var => "var",
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::For => "for",
            Keyword::In => "in",
            Keyword::While => "while",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Return => "return",
            Keyword::Function => "function",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Typeof => "typeof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Ellipsis,
    Question,
    QuestionQuestion,
    Colon,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    AndAnd,
    OrOr,
    PlusPlus,
    MinusMinus,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Dot => ".",
            Punct::Ellipsis => "...",
            Punct::Question => "?",
            Punct::QuestionQuestion => "??",
            Punct::Colon => ":",
            Punct::Assign => "=",
            Punct::PlusAssign => "+=",
            Punct::MinusAssign => "-=",
            Punct::StarAssign => "*=",
            Punct::SlashAssign => "/=",
            Punct::PercentAssign => "%=",
            Punct::Eq => "==",
            Punct::NotEq => "!=",
            Punct::StrictEq => "===",
            Punct::StrictNotEq => "!==",
            Punct::Lt => "<",
            Punct::LtEq => "<=",
            Punct::Gt => ">",
            Punct::GtEq => ">=",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Not => "!",
            Punct::AndAnd => "&&",
            Punct::OrOr => "||",
            Punct::PlusPlus => "++",
            Punct::MinusMinus => "--",
        }
    }
}

/// Longest-first so that `===` wins over `==` and `=`.
const PUNCTUATORS: &[(&str, Punct)] = &[
    ("===", Punct::StrictEq),
    ("!==", Punct::StrictNotEq),
    ("...", Punct::Ellipsis),
    ("==", Punct::Eq),
    ("!=", Punct::NotEq),
    ("<=", Punct::LtEq),
    (">=", Punct::GtEq),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("??", Punct::QuestionQuestion),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("+=", Punct::PlusAssign),
    ("-=", Punct::MinusAssign),
    ("*=", Punct::StarAssign),
    ("/=", Punct::SlashAssign),
    ("%=", Punct::PercentAssign),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    (",", Punct::Comma),
    (";", Punct::Semicolon),
    (".", Punct::Dot),
    ("?", Punct::Question),
    (":", Punct::Colon),
    ("=", Punct::Assign),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("!", Punct::Not),
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    Number(f64),
    Str(String),
    Punct(Punct),
    Eof,
}

impl TokenKind {
    /// How the token reads in an "Unexpected token" message.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Keyword(keyword) => format!("token '{}'", keyword.as_str()),
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Punct(punct) => format!("token '{}'", punct.as_str()),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    /// A line terminator separates this token from the previous one.
    pub newline_before: bool,
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

/// Whether `name` lexes as a single identifier that is not a keyword.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => {}
        _ => return false,
    }
    chars.all(is_ident_continue) && Keyword::from_ident(name).is_none()
}

/// Splits `source` into tokens, ending with a single [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self { chars: source.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if is_line_terminator(c) {
            // \r\n counts as one line break
            if !(c == '\r' && self.peek() == Some('\n')) {
                self.line += 1;
                self.column = 1;
            }
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line, self.column)
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let newline_before = self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let kind = match self.peek() {
                None => TokenKind::Eof,
                Some(c) if is_ident_start(c) => self.ident_or_keyword(),
                Some(c) if c.is_ascii_digit() => self.number()?,
                Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
                Some(quote @ ('\'' | '"')) => self.string(quote)?,
                Some(_) => self.punct()?,
            };
            let done = kind == TokenKind::Eof;
            tokens.push(Token { kind, line, column, newline_before });
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Skips whitespace and comments, reporting whether a line break was seen.
    fn skip_trivia(&mut self) -> Result<bool, ParseError> {
        let mut newline = false;
        while let Some(c) = self.peek() {
            if is_line_terminator(c) {
                newline = true;
                self.bump();
            } else if c.is_whitespace() || c == '\u{feff}' {
                self.bump();
            } else if c == '/' && self.peek_at(1) == Some('/') {
                while self.peek().is_some_and(|c| !is_line_terminator(c)) {
                    self.bump();
                }
            } else if c == '/' && self.peek_at(1) == Some('*') {
                self.bump();
                self.bump();
                loop {
                    match self.peek() {
                        None => return Err(self.error("Unterminated comment")),
                        Some('*') if self.peek_at(1) == Some('/') => {
                            self.bump();
                            self.bump();
                            break;
                        }
                        Some(c) => {
                            newline |= is_line_terminator(c);
                            self.bump();
                        }
                    }
                }
            } else {
                break;
            }
        }
        Ok(newline)
    }

    fn ident_or_keyword(&mut self) -> TokenKind {
        let mut ident = String::new();
        while let Some(c) = self.peek().filter(|c| is_ident_continue(*c)) {
            ident.push(c);
            self.bump();
        }
        match Keyword::from_ident(&ident) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident(ident),
        }
    }

    fn number(&mut self) -> Result<TokenKind, ParseError> {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_hexdigit()) {
                digits.push(c);
                self.bump();
            }
            let value = u64::from_str_radix(&digits, 16)
                .map_err(|_| self.error("Invalid hexadecimal literal"))?;
            return Ok(TokenKind::Number(value as f64));
        }

        let mut text = String::new();
        self.take_digits(&mut text);
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            self.take_digits(&mut text);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    text.extend(self.bump());
                }
                self.take_digits(&mut text);
            }
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(self.error("Invalid or unexpected token"));
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("Invalid number literal '{text}'")))
    }

    fn take_digits(&mut self, into: &mut String) {
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
            into.push(c);
            self.bump();
        }
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("Invalid or unexpected token")),
                Some(c) if c == quote => return Ok(TokenKind::Str(value)),
                Some('\n' | '\r') => return Err(self.error("Invalid or unexpected token")),
                Some('\\') => self.escape_sequence(&mut value)?,
                Some(c) => value.push(c),
            }
        }
    }

    fn escape_sequence(&mut self, value: &mut String) -> Result<(), ParseError> {
        let c = self.bump().ok_or_else(|| self.error("Invalid or unexpected token"))?;
        match c {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
            'x' => {
                let code = self.hex_digits(2)?;
                value.push(self.code_point(code)?);
            }
            'u' if self.peek() == Some('{') => {
                self.bump();
                let mut code = 0u32;
                let mut count = 0;
                while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
                    code = code.saturating_mul(16).saturating_add(digit);
                    count += 1;
                    self.bump();
                }
                if count == 0 || self.bump() != Some('}') {
                    return Err(self.error("Invalid Unicode escape sequence"));
                }
                value.push(self.code_point(code)?);
            }
            'u' => {
                let code = self.hex_digits(4)?;
                if (0xD800..0xDC00).contains(&code)
                    && self.peek() == Some('\\')
                    && self.peek_at(1) == Some('u')
                {
                    self.bump();
                    self.bump();
                    let low = self.hex_digits(4)?;
                    if (0xDC00..0xE000).contains(&low) {
                        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        value.push(self.code_point(combined)?);
                    } else {
                        value.push(char::REPLACEMENT_CHARACTER);
                        value.push(self.code_point(low)?);
                    }
                } else {
                    value.push(self.code_point(code)?);
                }
            }
            // Line continuation
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => value.push(other),
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, ParseError> {
        let mut code = 0;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid hexadecimal escape sequence"))?;
            code = code * 16 + digit;
            self.bump();
        }
        Ok(code)
    }

    /// Lone surrogates have no `char`; they degrade to U+FFFD.
    fn code_point(&self, code: u32) -> Result<char, ParseError> {
        if code > 0x10FFFF {
            return Err(self.error("Undefined Unicode code-point"));
        }
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn punct(&mut self) -> Result<TokenKind, ParseError> {
        for (text, punct) in PUNCTUATORS {
            let matches = text.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c));
            if matches {
                for _ in 0..text.len() {
                    self.bump();
                }
                return Ok(TokenKind::Punct(*punct));
            }
        }
        let c = self.peek().unwrap_or_default();
        Err(self.error(format!("Invalid or unexpected token '{c}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_accumulator_statement() {
        assert_eq!(
            kinds("__p+='a\\'b';"),
            vec![
                TokenKind::Ident("__p".into()),
                TokenKind::Punct(Punct::PlusAssign),
                TokenKind::Str("a'b".into()),
                TokenKind::Punct(Punct::Semicolon),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn prefers_longest_punctuator() {
        assert_eq!(
            kinds("a===b!==c==d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct(Punct::StrictEq),
                TokenKind::Ident("b".into()),
                TokenKind::Punct(Punct::StrictNotEq),
                TokenKind::Ident("c".into()),
                TokenKind::Punct(Punct::Eq),
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decodes_string_escapes() {
        assert_eq!(
            kinds(r"'\\ \n \r \t \u2028 \u2029 \x41 \u{1F600} \uD83D\uDE00 \q'")[0],
            TokenKind::Str("\\ \n \r \t \u{2028} \u{2029} A \u{1F600} \u{1F600} q".into())
        );
        assert_eq!(kinds("\"it's\"")[0], TokenKind::Str("it's".into()));
    }

    #[test]
    fn reads_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Number(42.0));
        assert_eq!(kinds("3.5e2")[0], TokenKind::Number(350.0));
        assert_eq!(kinds(".25")[0], TokenKind::Number(0.25));
        assert_eq!(kinds("0xff")[0], TokenKind::Number(255.0));
        assert!(tokenize("12abc").is_err());
    }

    #[test]
    fn records_newlines_and_skips_comments() {
        let tokens = tokenize("a // note\n/* block\n */ b c").unwrap();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
        assert!(!tokens[2].newline_before);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = tokenize("'abc\n'").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(tokenize("'abc").is_err());
    }

    #[test]
    fn identifier_check() {
        assert!(is_identifier("obj"));
        assert!(is_identifier("$el"));
        assert!(is_identifier("_"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("if"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
