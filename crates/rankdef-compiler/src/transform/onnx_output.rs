use indexmap::IndexMap;

use super::{ExpressionTransformer, TransformContext, rewrite_post_order};
use crate::Result;
use crate::expr::Expr;
use crate::profile::OnnxModel;
use crate::reference::Reference;

/// Names the output of every `onnx(model)` reference: the default output
/// when none is given, and the alias when the model's own output name is.
pub struct OnnxOutputTransformer;

impl ExpressionTransformer for OnnxOutputTransformer {
    fn name(&self) -> &'static str {
        "onnx-output"
    }

    fn transform(&self, expr: Expr, context: &mut TransformContext<'_>) -> Result<Expr> {
        let models = context.onnx_models;
        rewrite_post_order(expr, &mut |node| match node {
            Expr::Reference(reference) if reference.name() == "onnx" => {
                Ok(Expr::Reference(with_output(reference, models)))
            }
            other => Ok(other),
        })
    }
}

fn with_output(reference: Reference, models: &IndexMap<String, OnnxModel>) -> Reference {
    let Some(model) = reference.simple_argument().and_then(|name| models.get(name)) else {
        return reference;
    };
    let output = match reference.output() {
        None => model.default_output(),
        Some(output) => model.outputs().get(output).map(String::as_str),
    };
    match output.map(str::to_owned) {
        Some(output) => reference.with_output(Some(output)),
        None => reference,
    }
}
