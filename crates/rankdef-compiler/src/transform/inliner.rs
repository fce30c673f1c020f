use indexmap::IndexMap;

use super::{ExpressionTransformer, TransformContext, as_operand, rewrite_post_order};
use crate::expr::Expr;
use crate::profile::RankingExpressionFunction;
use crate::{Error, Result};

/// Substitutes references to inline zero-argument functions with their
/// bodies, recursively.
pub struct FunctionInliner;

impl ExpressionTransformer for FunctionInliner {
    fn name(&self) -> &'static str {
        "inline-functions"
    }

    fn transform(&self, expr: Expr, context: &mut TransformContext<'_>) -> Result<Expr> {
        if context.inline_functions.is_empty() {
            return Ok(expr);
        }
        inline(expr, context.inline_functions, &mut Vec::new())
    }
}

fn inline(
    expr: Expr,
    functions: &IndexMap<String, RankingExpressionFunction>,
    active: &mut Vec<String>,
) -> Result<Expr> {
    rewrite_post_order(expr, &mut |node| {
        let Expr::Reference(reference) = &node else {
            return Ok(node);
        };
        let Some(function) = functions
            .get(reference.name())
            .filter(|f| f.arguments().is_empty())
        else {
            return Ok(node);
        };
        if !reference.is_identifier() {
            return Ok(node);
        }
        if active.iter().any(|name| name == function.name()) {
            let mut path = active.clone();
            path.push(function.name().to_owned());
            return Err(Error::InvocationLoop(path));
        }
        active.push(function.name().to_owned());
        let body = inline(function.body().clone(), functions, active)?;
        active.pop();
        Ok(as_operand(body))
    })
}
