use super::{ExpressionTransformer, TransformContext, rewrite_post_order};
use crate::Result;
use crate::expr::{Aggregator, Builtin, Expr, TypeResolver};

/// `max(t, d)` and `min(t, d)`, where `d` is a dimension of the tensor
/// `t`, are reductions over `d` rather than element-wise maximum/minimum.
pub struct TensorMaxMinTransformer;

impl ExpressionTransformer for TensorMaxMinTransformer {
    fn name(&self) -> &'static str {
        "tensor-max-min"
    }

    fn transform(&self, expr: Expr, context: &mut TransformContext<'_>) -> Result<Expr> {
        let types = context.types;
        rewrite_post_order(expr, &mut |node| as_reduce(node, types))
    }
}

fn as_reduce(node: Expr, types: &dyn TypeResolver) -> Result<Expr> {
    let Expr::Call {
        function: function @ (Builtin::Max | Builtin::Min),
        arguments,
    } = &node
    else {
        return Ok(node);
    };
    let [argument, Expr::Reference(dimension)] = arguments.as_slice() else {
        return Ok(node);
    };
    if !dimension.is_identifier() || argument.type_of(types)?.dimension(dimension.name()).is_none()
    {
        return Ok(node);
    }
    let aggregator = match function {
        Builtin::Max => Aggregator::Max,
        _ => Aggregator::Min,
    };
    Ok(Expr::Reduce {
        argument: Box::new(argument.clone()),
        aggregator,
        dimensions: vec![dimension.name().to_owned()],
    })
}
