use crate::Result;
use crate::expr::{Expr, ExpressionFunction};

/// A function declared in a rank profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankingExpressionFunction {
    pub function: ExpressionFunction,
    /// Inline functions are substituted into their callers when compiled.
    pub inline: bool,
}

impl RankingExpressionFunction {
    pub fn new(function: ExpressionFunction, inline: bool) -> Self {
        Self { function, inline }
    }

    pub fn parse(name: &str, arguments: &[&str], body: &str, inline: bool) -> Result<Self> {
        let arguments = arguments.iter().map(|a| a.to_string()).collect();
        Ok(Self::new(
            ExpressionFunction::new(name, arguments, Expr::parse(body)?),
            inline,
        ))
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.function.arguments
    }

    pub fn body(&self) -> &Expr {
        &self.function.body.root
    }

    pub fn with_body(&self, body: Expr) -> Self {
        Self::new(self.function.with_body(body), self.inline)
    }
}
