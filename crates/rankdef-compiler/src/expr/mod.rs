//! Ranking expression language: lexing, parsing, printing and type rules.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod types;

#[cfg(test)]
mod types_tests;

pub use ast::{Aggregator, BinaryOp, Builtin, Expr, Lambda, Literal, UnaryOp, quote_string};
pub use parser::ParseError;
pub use types::TypeResolver;

impl Expr {
    pub fn parse(text: &str) -> Result<Expr, ParseError> {
        parser::parse(text)
    }
}

/// A named expression: a phase expression or a function body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankingExpression {
    pub name: String,
    pub root: Expr,
}

impl RankingExpression {
    pub fn new(name: impl Into<String>, root: Expr) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, ParseError> {
        Ok(Self::new(name, Expr::parse(text)?))
    }
}

impl std::fmt::Display for RankingExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// A user function: name, ordered parameter names and body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionFunction {
    pub name: String,
    pub arguments: Vec<String>,
    pub body: RankingExpression,
}

impl ExpressionFunction {
    pub fn new(name: impl Into<String>, arguments: Vec<String>, body: Expr) -> Self {
        let name = name.into();
        Self {
            body: RankingExpression::new(name.clone(), body),
            name,
            arguments,
        }
    }

    pub fn with_body(&self, body: Expr) -> Self {
        Self::new(self.name.clone(), self.arguments.clone(), body)
    }
}
