//! Recursive-descent parser for the embedded statement language.
//!
//! Binary operators are parsed by precedence climbing. Semicolons are
//! optional wherever a line break, a closing brace or the end of input
//! separates two statements.

use super::ast::{
    AssignOp, BinaryOp, DeclKind, Expr, ForBinding, FunctionExpr, LogicalOp, Stmt, UnaryOp,
};
use super::error::ParseError;
use super::lexer::{tokenize, Keyword, Punct, Token, TokenKind};
use super::stack::ensure_sufficient_stack;
use super::value::number_to_string;
use crate::constants::limits::MAX_NESTING_DEPTH;
use std::sync::Arc;

type ParseResult<T> = Result<T, ParseError>;

/// Parses the statements of a function body.
pub fn parse_body(source: &str) -> ParseResult<Vec<Stmt>> {
    let mut parser = Parser::new(source)?;
    parser.function_depth = 1;
    let body = parser.parse_statements()?;
    parser.expect_eof()?;
    Ok(body)
}

/// Parses a complete `function (params) { body }` definition.
pub fn parse_function(source: &str) -> ParseResult<FunctionExpr> {
    let mut parser = Parser::new(source)?;
    if !parser.eat_keyword(Keyword::Function) {
        return Err(parser.unexpected());
    }
    let name = parser.optional_ident();
    let function = parser.parse_function_rest(name)?;
    parser.expect_eof()?;
    Ok(function)
}

enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn infix_operator(kind: &TokenKind) -> Option<(u8, Infix)> {
    let TokenKind::Punct(punct) = kind else {
        return None;
    };
    let operator = match punct {
        Punct::QuestionQuestion => (1, Infix::Logical(LogicalOp::Nullish)),
        Punct::OrOr => (2, Infix::Logical(LogicalOp::Or)),
        Punct::AndAnd => (3, Infix::Logical(LogicalOp::And)),
        Punct::Eq => (4, Infix::Binary(BinaryOp::Eq)),
        Punct::NotEq => (4, Infix::Binary(BinaryOp::NotEq)),
        Punct::StrictEq => (4, Infix::Binary(BinaryOp::StrictEq)),
        Punct::StrictNotEq => (4, Infix::Binary(BinaryOp::StrictNotEq)),
        Punct::Lt => (5, Infix::Binary(BinaryOp::Lt)),
        Punct::LtEq => (5, Infix::Binary(BinaryOp::LtEq)),
        Punct::Gt => (5, Infix::Binary(BinaryOp::Gt)),
        Punct::GtEq => (5, Infix::Binary(BinaryOp::GtEq)),
        Punct::Plus => (6, Infix::Binary(BinaryOp::Add)),
        Punct::Minus => (6, Infix::Binary(BinaryOp::Sub)),
        Punct::Star => (7, Infix::Binary(BinaryOp::Mul)),
        Punct::Slash => (7, Infix::Binary(BinaryOp::Div)),
        Punct::Percent => (7, Infix::Binary(BinaryOp::Rem)),
        _ => return None,
    };
    Some(operator)
}

fn assign_operator(kind: &TokenKind) -> Option<AssignOp> {
    let TokenKind::Punct(punct) = kind else {
        return None;
    };
    let op = match punct {
        Punct::Assign => AssignOp::Assign,
        Punct::PlusAssign => AssignOp::Compound(BinaryOp::Add),
        Punct::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
        Punct::StarAssign => AssignOp::Compound(BinaryOp::Mul),
        Punct::SlashAssign => AssignOp::Compound(BinaryOp::Div),
        Punct::PercentAssign => AssignOp::Compound(BinaryOp::Rem),
        _ => return None,
    };
    Some(op)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    loop_depth: usize,
    function_depth: usize,
    /// Statements and expressions currently open.
    nesting: usize,
}

impl Parser {
    fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            loop_depth: 0,
            function_depth: 0,
            nesting: 0,
        })
    }

    /// Runs a recursive production, failing once nesting passes the limit.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(self.error_here("Maximum nesting depth exceeded"));
        }
        self.nesting += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.nesting -= 1;
        result
    }

    // ----- token cursor -----

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn nth_kind(&self, n: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn is_punct(&self, punct: Punct) -> bool {
        *self.peek_kind() == TokenKind::Punct(punct)
    }

    fn is_keyword(&self, keyword: Keyword) -> bool {
        *self.peek_kind() == TokenKind::Keyword(keyword)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        let found = self.is_punct(punct);
        if found {
            self.advance();
        }
        found
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        let found = self.is_keyword(keyword);
        if found {
            self.advance();
        }
        found
    }

    fn expect_punct(&mut self, punct: Punct) -> ParseResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.optional_ident() {
            Some(name) => Ok(name),
            None => Err(self.unexpected()),
        }
    }

    fn optional_ident(&mut self) -> Option<String> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            let name = name.clone();
            self.advance();
            Some(name)
        } else {
            None
        }
    }

    fn expect_eof(&self) -> ParseResult<()> {
        if *self.peek_kind() == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::new(message, token.line, token.column)
    }

    fn unexpected(&self) -> ParseError {
        match self.peek_kind() {
            TokenKind::Eof => self.error_here("Unexpected end of input"),
            kind => self.error_here(format!("Unexpected {}", kind.describe())),
        }
    }

    /// Automatic semicolon insertion.
    fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.eat_punct(Punct::Semicolon)
            || self.is_punct(Punct::RBrace)
            || *self.peek_kind() == TokenKind::Eof
            || self.peek().newline_before
        {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    // ----- statements -----

    fn parse_statements(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.is_punct(Punct::RBrace) && *self.peek_kind() != TokenKind::Eof {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect_punct(Punct::LBrace)?;
        let statements = self.parse_statements()?;
        self.expect_punct(Punct::RBrace)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek_kind().clone() {
            TokenKind::Punct(Punct::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Punct(Punct::Semicolon) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::Keyword(keyword @ (Keyword::Var | Keyword::Let | Keyword::Const)) => {
                self.advance();
                let declaration = self.parse_declaration(decl_kind(keyword))?;
                self.consume_semicolon()?;
                Ok(declaration)
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::While) => {
                self.advance();
                self.expect_punct(Punct::LParen)?;
                let test = self.parse_expression()?;
                self.expect_punct(Punct::RParen)?;
                let body = self.parse_loop_body()?;
                Ok(Stmt::While { test, body })
            }
            TokenKind::Keyword(Keyword::Break) => {
                if self.loop_depth == 0 {
                    return Err(self.error_here("Illegal break statement"));
                }
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Break)
            }
            TokenKind::Keyword(Keyword::Continue) => {
                if self.loop_depth == 0 {
                    return Err(self.error_here("Illegal continue statement"));
                }
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Continue)
            }
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::Function) => {
                self.advance();
                let Some(name) = self.optional_ident() else {
                    return Err(self.error_here("Function statements require a function name"));
                };
                let function = self.parse_function_rest(Some(name))?;
                Ok(Stmt::Function(Arc::new(function)))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_declaration(&mut self, kind: DeclKind) -> ParseResult<Stmt> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.parse_assignment()?)
            } else if kind == DeclKind::Const {
                return Err(self.error_here("Missing initializer in const declaration"));
            } else {
                None
            };
            decls.push((name, init));
            if !self.eat_punct(Punct::Comma) {
                return Ok(Stmt::Declare { kind, decls });
            }
        }
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punct(Punct::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If { test, consequent, alternate })
    }

    fn parse_loop_body(&mut self) -> ParseResult<Box<Stmt>> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        Ok(Box::new(body?))
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen)?;

        if let Some(binding) = self.parse_for_binding() {
            let of = self.eat_keyword(Keyword::In).then_some(false).or_else(|| {
                matches!(self.peek_kind(), TokenKind::Ident(word) if word == "of").then_some(true)
            });
            if of == Some(true) {
                self.advance();
            }
            let target = self.parse_expression()?;
            self.expect_punct(Punct::RParen)?;
            let body = self.parse_loop_body()?;
            return Ok(match of {
                Some(true) => Stmt::ForOf { binding, iterable: target, body },
                _ => Stmt::ForIn { binding, object: target, body },
            });
        }

        let init = match self.peek_kind().clone() {
            TokenKind::Punct(Punct::Semicolon) => None,
            TokenKind::Keyword(keyword @ (Keyword::Var | Keyword::Let | Keyword::Const)) => {
                self.advance();
                Some(Box::new(self.parse_declaration(decl_kind(keyword))?))
            }
            _ => Some(Box::new(Stmt::Expr(self.parse_expression()?))),
        };
        self.expect_punct(Punct::Semicolon)?;
        let test = if self.is_punct(Punct::Semicolon) { None } else { Some(self.parse_expression()?) };
        self.expect_punct(Punct::Semicolon)?;
        let update = if self.is_punct(Punct::RParen) { None } else { Some(self.parse_expression()?) };
        self.expect_punct(Punct::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::For { init, test, update, body })
    }

    /// Consumes `[var|let|const] name` when it is followed by `in` or `of`.
    fn parse_for_binding(&mut self) -> Option<ForBinding> {
        let is_iteration_word = |kind: &TokenKind| match kind {
            TokenKind::Keyword(Keyword::In) => true,
            TokenKind::Ident(word) => word == "of",
            _ => false,
        };

        let (kind, offset) = match self.peek_kind() {
            TokenKind::Keyword(keyword @ (Keyword::Var | Keyword::Let | Keyword::Const)) => {
                (Some(decl_kind(*keyword)), 1)
            }
            _ => (None, 0),
        };
        let TokenKind::Ident(name) = self.nth_kind(offset) else {
            return None;
        };
        if !is_iteration_word(self.nth_kind(offset + 1)) {
            return None;
        }
        let name = name.clone();
        for _ in 0..=offset {
            self.advance();
        }
        Some(ForBinding { kind, name })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        if self.function_depth == 0 {
            return Err(self.error_here("Illegal return statement"));
        }
        self.advance();
        let ends_here = self.is_punct(Punct::Semicolon)
            || self.is_punct(Punct::RBrace)
            || *self.peek_kind() == TokenKind::Eof
            || self.peek().newline_before;
        let value = if ends_here { None } else { Some(self.parse_expression()?) };
        self.consume_semicolon()?;
        Ok(Stmt::Return(value))
    }

    fn parse_function_rest(&mut self, name: Option<String>) -> ParseResult<FunctionExpr> {
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        let mut rest = None;
        while !self.is_punct(Punct::RParen) {
            if self.eat_punct(Punct::Ellipsis) {
                rest = Some(self.expect_ident()?);
                break;
            }
            params.push(self.expect_ident()?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen)?;

        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loop_depth;

        Ok(FunctionExpr { name, params, rest, body: body? })
    }

    // ----- expressions -----

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let left = self.parse_conditional()?;
        let Some(op) = assign_operator(self.peek_kind()) else {
            return Ok(left);
        };
        if !left.is_assignable() {
            return Err(self.error_here("Invalid left-hand side in assignment"));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign { op, target: Box::new(left), value: Box::new(value) })
    }

    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let test = self.parse_binary(1)?;
        if !self.eat_punct(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect_punct(Punct::Colon)?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((precedence, infix)) = infix_operator(self.peek_kind()) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = Box::new(self.parse_binary(precedence + 1)?);
            let lhs = Box::new(left);
            left = match infix {
                Infix::Binary(op) => Expr::Binary { op, left: lhs, right },
                Infix::Logical(op) => Expr::Logical { op, left: lhs, right },
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        self.nested(Self::unary)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Punct(Punct::Not) => UnaryOp::Not,
            TokenKind::Punct(Punct::Minus) => UnaryOp::Neg,
            TokenKind::Punct(Punct::Plus) => UnaryOp::Plus,
            TokenKind::Keyword(Keyword::Typeof) => UnaryOp::Typeof,
            TokenKind::Punct(punct @ (Punct::PlusPlus | Punct::MinusMinus)) => {
                let increment = *punct == Punct::PlusPlus;
                self.advance();
                let target = self.parse_unary()?;
                if !target.is_assignable() {
                    return Err(
                        self.error_here("Invalid left-hand side expression in prefix operation")
                    );
                }
                return Ok(Expr::Update { increment, prefix: true, target: Box::new(target) });
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary { op, operand: Box::new(operand) })
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_call_member()?;
        let increment = match self.peek_kind() {
            TokenKind::Punct(Punct::PlusPlus) => true,
            TokenKind::Punct(Punct::MinusMinus) => false,
            _ => return Ok(expr),
        };
        if self.peek().newline_before {
            return Ok(expr);
        }
        if !expr.is_assignable() {
            return Err(self.error_here("Invalid left-hand side expression in postfix operation"));
        }
        self.advance();
        Ok(Expr::Update { increment, prefix: false, target: Box::new(expr) })
    }

    fn parse_call_member(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_punct(Punct::Dot) {
                let property = match self.peek_kind() {
                    TokenKind::Ident(name) => name.clone(),
                    TokenKind::Keyword(keyword) => keyword.as_str().to_string(),
                    _ => return Err(self.unexpected()),
                };
                self.advance();
                expr = Expr::Member { object: Box::new(expr), property };
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.parse_expression()?;
                self.expect_punct(Punct::RBracket)?;
                expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
            } else if self.eat_punct(Punct::LParen) {
                let args = self.parse_list(Punct::RParen)?;
                expr = Expr::Call { callee: Box::new(expr), args };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    fn parse_list(&mut self, close: Punct) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.is_punct(close) {
            items.push(self.parse_assignment()?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(close)?;
        Ok(items)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::Ident(name) => Ok(Expr::Ident(name)),
            TokenKind::Keyword(Keyword::True) => Ok(Expr::Bool(true)),
            TokenKind::Keyword(Keyword::False) => Ok(Expr::Bool(false)),
            TokenKind::Keyword(Keyword::Null) => Ok(Expr::Null),
            TokenKind::Keyword(Keyword::Function) => {
                let name = self.optional_ident();
                Ok(Expr::Function(Arc::new(self.parse_function_rest(name)?)))
            }
            TokenKind::Punct(Punct::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_punct(Punct::RParen)?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::LBracket) => Ok(Expr::Array(self.parse_list(Punct::RBracket)?)),
            TokenKind::Punct(Punct::LBrace) => self.parse_object(),
            TokenKind::Eof => Err(self.unexpected()),
            kind => Err(ParseError::new(
                format!("Unexpected {}", kind.describe()),
                token.line,
                token.column,
            )),
        }
    }

    fn parse_object(&mut self) -> ParseResult<Expr> {
        let mut properties = Vec::new();
        while !self.is_punct(Punct::RBrace) {
            let (key, shorthand) = match self.peek_kind() {
                TokenKind::Ident(name) => (name.clone(), true),
                TokenKind::Keyword(keyword) => (keyword.as_str().to_string(), false),
                TokenKind::Str(s) => (s.clone(), false),
                TokenKind::Number(n) => (number_to_string(*n), false),
                _ => return Err(self.unexpected()),
            };
            self.advance();
            let value = if self.eat_punct(Punct::Colon) {
                self.parse_assignment()?
            } else if shorthand {
                Expr::Ident(key.clone())
            } else {
                return Err(self.unexpected());
            };
            properties.push((key, value));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(Expr::Object(properties))
    }
}

fn decl_kind(keyword: Keyword) -> DeclKind {
    match keyword {
        Keyword::Let => DeclKind::Let,
        Keyword::Const => DeclKind::Const,
        _ => DeclKind::Var,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        match parse_body(source).unwrap().remove(0) {
            Stmt::Expr(expr) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let Expr::Binary { op: BinaryOp::Add, right, .. } = expr("1 + 2 * 3") else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn parses_accumulator_pattern() {
        let body = parse_body("__p+='a'+\n((__t=( x ))==null?'':__t)+\n'b';\n").unwrap();
        assert_eq!(body.len(), 1);
        let Stmt::Expr(Expr::Assign { op, target, .. }) = &body[0] else {
            panic!("expected compound assignment");
        };
        assert_eq!(*op, AssignOp::Compound(BinaryOp::Add));
        assert_eq!(**target, Expr::Ident("__p".into()));
    }

    #[test]
    fn semicolons_are_optional_across_lines() {
        let body = parse_body("var a = 1\nvar b = 2\na + b").unwrap();
        assert_eq!(body.len(), 3);
        assert!(parse_body("a b").is_err());
    }

    #[test]
    fn for_headers() {
        let body = parse_body(
            "for (var i = 0; i < 3; i++) {}\nfor (key in obj) {}\nfor (const item of list) {}\nfor (;;) { break }",
        )
        .unwrap();
        assert!(matches!(body[0], Stmt::For { .. }));
        assert!(matches!(&body[1], Stmt::ForIn { binding, .. } if binding.kind.is_none() && binding.name == "key"));
        assert!(matches!(&body[2], Stmt::ForOf { binding, .. } if binding.kind == Some(DeclKind::Const)));
        assert!(matches!(body[3], Stmt::For { init: None, test: None, update: None, .. }));
    }

    #[test]
    fn if_else_chain() {
        let body = parse_body("if (a) { x() } else if (b) y(); else { z() }").unwrap();
        let Stmt::If { alternate: Some(alternate), .. } = &body[0] else {
            panic!("expected if with else");
        };
        assert!(matches!(**alternate, Stmt::If { alternate: Some(_), .. }));
    }

    #[test]
    fn function_expressions_and_rest_params() {
        let body = parse_body("print = function(...args) { return args.join(''); };").unwrap();
        let Stmt::Expr(Expr::Assign { value, .. }) = &body[0] else {
            panic!("expected assignment");
        };
        let Expr::Function(function) = &**value else {
            panic!("expected function expression");
        };
        assert!(function.params.is_empty());
        assert_eq!(function.rest.as_deref(), Some("args"));
    }

    #[test]
    fn parses_definition() {
        let function = parse_function("function(obj){\nreturn obj;\n}").unwrap();
        assert_eq!(function.params, vec!["obj".to_string()]);
        assert_eq!(function.body.len(), 1);
        assert!(parse_function("function(obj){ return obj; } extra").is_err());
    }

    #[test]
    fn object_and_array_literals() {
        let Expr::Object(properties) = expr("({a: 1, 'b c': [1, 2,], 3: x, d})") else {
            panic!("expected object literal");
        };
        let keys: Vec<_> = properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b c", "3", "d"]);
    }

    #[test]
    fn reports_syntax_errors_with_position() {
        let err = parse_body("if (x) {\n  y(\n").unwrap_err();
        assert_eq!(err.message, "Unexpected end of input");
        let err = parse_body("a = ;").unwrap_err();
        assert_eq!(err.message, "Unexpected token ';'");
        assert_eq!((err.line, err.column), (1, 5));
        assert_eq!(parse_body("1 = 2").unwrap_err().message, "Invalid left-hand side in assignment");
    }

    #[test]
    fn control_flow_outside_its_context_is_rejected() {
        assert_eq!(parse_body("break").unwrap_err().message, "Illegal break statement");
        assert_eq!(parse_body("continue;").unwrap_err().message, "Illegal continue statement");
        assert!(parse_body("while (x) { function f() { break } }").is_err());
        assert!(parse_body("while (x) { if (y) break }").is_ok());
    }

    #[test]
    fn return_respects_line_breaks() {
        let body = parse_body("return\nx").unwrap();
        assert_eq!(body[0], Stmt::Return(None));
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn postfix_update_requires_same_line() {
        let body = parse_body("a\n++b").unwrap();
        assert_eq!(body.len(), 2);
        assert!(matches!(&body[1], Stmt::Expr(Expr::Update { prefix: true, .. })));
    }

    #[test]
    fn nesting_is_bounded() {
        let shallow = format!("{}1{}", "(".repeat(150), ")".repeat(150));
        assert_eq!(parse_body(&shallow).unwrap(), vec![Stmt::Expr(Expr::Number(1.0))]);

        let parens = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        assert_eq!(parse_body(&parens).unwrap_err().message, "Maximum nesting depth exceeded");
        let negations = format!("{}x", "!".repeat(5000));
        assert_eq!(parse_body(&negations).unwrap_err().message, "Maximum nesting depth exceeded");
        let blocks = format!("{}{}", "{".repeat(5000), "}".repeat(5000));
        assert_eq!(parse_body(&blocks).unwrap_err().message, "Maximum nesting depth exceeded");
    }
}
