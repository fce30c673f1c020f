//! Recursive descent parser for ranking expressions.
//!
//! Binary operators are parsed by precedence climbing, all left associative.
//! Feature arguments accept hyphenated identifiers written without spaces
//! (`attribute(my-field)`), which elsewhere would be a subtraction.

use std::ops::Range;

use super::ast::{Aggregator, BinaryOp, Builtin, Expr, Lambda, Literal, UnaryOp};
use super::lexer::{Token, TokenKind, lex, string_value};
use crate::reference::Reference;

/// Nesting limit guarding the recursive descent against stack exhaustion.
pub const MAX_DEPTH: usize = 256;

/// Parse failure with the byte span of the offending input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not parse '{text}': {message} (at byte {})", .span.start)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub text: String,
}

pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(text);
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error_at(
            token.span(),
            format!("expected end of expression, found {}", token.kind.describe()),
        ));
    }
    Ok(expr)
}

/// Parse feature references separated by whitespace and/or commas.
pub fn parse_feature_list(text: &str) -> Result<Vec<Reference>, ParseError> {
    let mut parser = Parser::new(text);
    let mut features = Vec::new();
    while let Some(token) = parser.peek() {
        if parser.eat(TokenKind::Comma) {
            continue;
        }
        let start = token.start;
        match parser.primary()? {
            Expr::Reference(reference) => features.push(reference),
            other => {
                let end = parser.previous_end();
                return Err(parser.error_at(
                    start..end,
                    format!("expected a feature reference, found {}", other.describe()),
                ));
            }
        }
    }
    Ok(features)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

type ParseResult<T> = Result<T, ParseError>;

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            tokens: lex(source),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn nth(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).copied()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.end)
    }

    fn error_at(&self, span: Range<usize>, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            span,
            text: self.source.to_owned(),
        }
    }

    fn error_here(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => self.error_at(
                token.span(),
                format!("expected {expected}, found {}", token.kind.describe()),
            ),
            None => {
                let end = self.source.len();
                self.error_at(end..end, format!("expected {expected}, found end of input"))
            }
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error_here(kind.describe())),
        }
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<&'s str> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.pos += 1;
                Ok(token.text(self.source))
            }
            _ => Err(self.error_here(what)),
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_DEPTH {
            let span = self.peek().map_or(self.source.len()..self.source.len(), |t| t.span());
            return Err(self.error_at(span, "expression is nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(|p| p.binary(1))
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        Some(match self.peek_kind()? {
            TokenKind::OrOr => BinaryOp::Or,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::EqEq => BinaryOp::Equal,
            TokenKind::NotEq => BinaryOp::NotEqual,
            TokenKind::TildeEq => BinaryOp::ApproxEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEq => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEq => BinaryOp::GreaterEqual,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Subtract,
            TokenKind::Star => BinaryOp::Multiply,
            TokenKind::Slash => BinaryOp::Divide,
            TokenKind::Percent => BinaryOp::Modulo,
            TokenKind::Caret => BinaryOp::Power,
            _ => return None,
        })
    }

    fn binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.binary_op()
            && op.precedence() >= min_precedence
        {
            self.pos += 1;
            let rhs = self.binary(op.precedence() + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek_kind() {
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Minus) => UnaryOp::Negate,
            _ => return self.primary(),
        };
        self.pos += 1;
        let operand = self.nested(|p| p.unary())?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("an expression"));
        };
        match token.kind {
            TokenKind::Number => {
                self.pos += 1;
                let text = token.text(self.source);
                let value = text
                    .parse::<f64>()
                    .map_err(|_| self.error_at(token.span(), format!("invalid number '{text}'")))?;
                Ok(Expr::number(value))
            }
            TokenKind::String => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::String(string_value(
                    token.text(self.source),
                ))))
            }
            TokenKind::ParenOpen => {
                self.pos += 1;
                let inner = self.expression()?;
                self.expect(TokenKind::ParenClose)?;
                Ok(Expr::Embraced(Box::new(inner)))
            }
            TokenKind::Identifier => self.identifier_expression(),
            _ => Err(self.error_here("an expression")),
        }
    }

    fn identifier_expression(&mut self) -> ParseResult<Expr> {
        let name = self.expect_identifier("an identifier")?;
        let called = self.peek_kind() == Some(TokenKind::ParenOpen);
        if !called {
            match name {
                "true" => return Ok(Expr::Literal(Literal::Bool(true))),
                "false" => return Ok(Expr::Literal(Literal::Bool(false))),
                _ => {}
            }
            let output = self.output()?;
            return Ok(Expr::Reference(Reference::new(name, Vec::new(), output)));
        }
        match name {
            "if" => self.if_expression(),
            "reduce" => self.reduce_expression(),
            "map" => self.map_expression(),
            "join" => self.join_expression(),
            _ => match Builtin::from_name(name) {
                Some(function) => self.builtin_call(function),
                None => self.feature(name),
            },
        }
    }

    fn if_expression(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::ParenOpen)?;
        let condition = self.expression()?;
        self.expect(TokenKind::Comma)?;
        let then = self.expression()?;
        self.expect(TokenKind::Comma)?;
        let otherwise = self.expression()?;
        self.expect(TokenKind::ParenClose)?;
        Ok(Expr::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn reduce_expression(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::ParenOpen)?;
        let argument = self.expression()?;
        self.expect(TokenKind::Comma)?;
        let span = self.peek().map(|t| t.span());
        let name = self.expect_identifier("an aggregator")?;
        let aggregator = Aggregator::from_name(name).ok_or_else(|| {
            self.error_at(
                span.clone().unwrap_or_default(),
                format!("unknown aggregator '{name}'"),
            )
        })?;
        let mut dimensions = Vec::new();
        while self.eat(TokenKind::Comma) {
            dimensions.push(self.expect_identifier("a dimension name")?.to_owned());
        }
        self.expect(TokenKind::ParenClose)?;
        Ok(Expr::Reduce {
            argument: Box::new(argument),
            aggregator,
            dimensions,
        })
    }

    fn map_expression(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::ParenOpen)?;
        let argument = self.expression()?;
        self.expect(TokenKind::Comma)?;
        let lambda = self.lambda()?;
        self.expect(TokenKind::ParenClose)?;
        Ok(Expr::Map {
            argument: Box::new(argument),
            lambda: Box::new(lambda),
        })
    }

    fn join_expression(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::ParenOpen)?;
        let lhs = self.expression()?;
        self.expect(TokenKind::Comma)?;
        let rhs = self.expression()?;
        self.expect(TokenKind::Comma)?;
        let lambda = self.lambda()?;
        self.expect(TokenKind::ParenClose)?;
        Ok(Expr::Join {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            lambda: Box::new(lambda),
        })
    }

    /// `f(a, b)(body)`
    fn lambda(&mut self) -> ParseResult<Lambda> {
        let span = self.peek().map(|t| t.span());
        if self.expect_identifier("a lambda 'f(...)(...)'")? != "f" {
            return Err(self.error_at(
                span.unwrap_or_default(),
                "a lambda must be written as f(parameters)(body)",
            ));
        }
        self.expect(TokenKind::ParenOpen)?;
        let mut parameters = Vec::new();
        if !self.eat(TokenKind::ParenClose) {
            loop {
                parameters.push(self.expect_identifier("a lambda parameter")?.to_owned());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::ParenClose)?;
        }
        self.expect(TokenKind::ParenOpen)?;
        let body = self.expression()?;
        self.expect(TokenKind::ParenClose)?;
        Ok(Lambda { parameters, body })
    }

    fn builtin_call(&mut self, function: Builtin) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::ParenOpen)?;
        let mut arguments = Vec::new();
        if !self.eat(TokenKind::ParenClose) {
            loop {
                arguments.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::ParenClose)?;
        }
        if arguments.len() != function.arity() {
            return Err(self.error_at(
                open.start..self.previous_end(),
                format!(
                    "{} takes {} argument(s), but {} were given",
                    function.name(),
                    function.arity(),
                    arguments.len()
                ),
            ));
        }
        Ok(Expr::Call {
            function,
            arguments,
        })
    }

    fn feature(&mut self, name: &str) -> ParseResult<Expr> {
        self.expect(TokenKind::ParenOpen)?;
        let mut arguments = Vec::new();
        if !self.eat(TokenKind::ParenClose) {
            loop {
                arguments.push(self.feature_argument()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::ParenClose)?;
        }
        let output = self.output()?;
        Ok(Expr::Reference(Reference::new(name, arguments, output)))
    }

    fn feature_argument(&mut self) -> ParseResult<Expr> {
        match self.argument_word() {
            Some(name) => Ok(Expr::Reference(Reference::identifier(name))),
            None => self.expression(),
        }
    }

    /// An argument written as one word with no whitespace, directly followed
    /// by `,` or `)`: `my-field`, `0abc` or `42`. A lone identifier is left
    /// to the expression parser.
    fn argument_word(&mut self) -> Option<String> {
        let first = self.peek().filter(|t| self.is_word_part(t))?;
        let mut last = first;
        let mut n = 1;
        loop {
            match (self.nth(n), self.nth(n + 1)) {
                (Some(part), _) if self.is_word_part(&part) && last.touches(&part) => {
                    last = part;
                    n += 1;
                }
                (Some(minus), Some(part))
                    if minus.kind == TokenKind::Minus
                        && self.is_word_part(&part)
                        && last.touches(&minus)
                        && minus.touches(&part) =>
                {
                    last = part;
                    n += 2;
                }
                _ => break,
            }
        }
        if n == 1 && first.kind == TokenKind::Identifier {
            return None;
        }
        match self.nth(n).map(|t| t.kind) {
            Some(TokenKind::Comma | TokenKind::ParenClose) => {
                self.pos += n;
                Some(self.source[first.start..last.end].to_owned())
            }
            _ => None,
        }
    }

    /// Identifiers and digit-only numbers can be joined into an argument word.
    fn is_word_part(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Identifier => true,
            TokenKind::Number => token.text(self.source).bytes().all(|b| b.is_ascii_digit()),
            _ => false,
        }
    }

    fn output(&mut self) -> ParseResult<Option<String>> {
        if !self.eat(TokenKind::Dot) {
            return Ok(None);
        }
        match self.peek() {
            Some(token) if matches!(token.kind, TokenKind::Identifier | TokenKind::Number) => {
                self.pos += 1;
                Ok(Some(token.text(self.source).to_owned()))
            }
            _ => Err(self.error_here("an output name")),
        }
    }
}
