use super::{ExpressionTransformer, TransformContext};
use crate::Result;
use crate::expr::Expr;
use crate::profile::{Constant, ConstantValue};

/// Exports every inline constant an expression uses as the rank
/// properties `constant(name).value` and `constant(name).type`.
pub struct ConstantTensorTransformer;

impl ExpressionTransformer for ConstantTensorTransformer {
    fn name(&self) -> &'static str {
        "constant-tensors"
    }

    fn transform(&self, expr: Expr, context: &mut TransformContext<'_>) -> Result<Expr> {
        let mut used: Vec<&Constant> = Vec::new();
        expr.for_each_reference(&mut |reference| {
            if let Some(constant) = context.constant(reference)
                && !used.contains(&constant)
            {
                used.push(constant);
            }
        });
        for constant in used {
            if let ConstantValue::Inline(value) = constant.value() {
                let feature = constant.reference();
                context.add_rank_property(format!("{feature}.value"), value.clone());
                context.add_rank_property(
                    format!("{feature}.type"),
                    constant.tensor_type().to_string(),
                );
            }
        }
        Ok(expr)
    }
}
