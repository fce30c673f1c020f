use super::{ExpressionTransformer, TransformContext, as_operand, rewrite_post_order};
use crate::expr::Expr;
use crate::models::ModelKind;
use crate::reference::Reference;
use crate::{Error, Result};

/// Replaces `lightgbm(path)`, `xgboost(path)` and `onnx_vespa(path)` with
/// the imported model's expression. The model's functions and constants
/// are added to the profile.
pub struct ModelImporter;

impl ExpressionTransformer for ModelImporter {
    fn name(&self) -> &'static str {
        "model-import"
    }

    fn transform(&self, expr: Expr, context: &mut TransformContext<'_>) -> Result<Expr> {
        rewrite_post_order(expr, &mut |node| match node {
            Expr::Reference(reference) if reference.output().is_none() => {
                match ModelKind::from_feature_name(reference.name()) {
                    Some(kind) => import(kind, &reference, context),
                    None => Ok(Expr::Reference(reference)),
                }
            }
            other => Ok(other),
        })
    }
}

fn import(
    kind: ModelKind,
    reference: &Reference,
    context: &mut TransformContext<'_>,
) -> Result<Expr> {
    let Some(path) = reference.simple_argument() else {
        return Err(Error::invalid(format!(
            "{reference}: {} takes the path of the model file as its only argument",
            kind.feature_name()
        )));
    };
    let model = context
        .models
        .get_by_path(kind, path)
        .ok_or_else(|| Error::UnknownModel(reference.to_string()))?;
    tracing::debug!(
        model = %model.name,
        kind = kind.feature_name(),
        "importing model expression"
    );
    for function in &model.functions {
        context.add_function(function.clone());
    }
    for constant in &model.constants {
        context.add_constant(constant.clone());
    }
    Ok(as_operand(model.expression.clone()))
}
