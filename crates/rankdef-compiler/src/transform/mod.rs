//! Expression transforms applied while compiling a rank profile.
//!
//! Every expression a profile compiles (phases and function bodies) runs
//! through [`ExpressionTransforms`] in order:
//! - `onnx_output` - `onnx(m)` gets the model's default output
//! - `model_import` - imported model references become model expressions
//! - `inliner` - inline functions are substituted into their callers
//! - `tensor_max_min` - `max(t, d)` / `min(t, d)` over a dimension become reductions
//! - `constant_tensors` - inline constants are exported as rank properties
//!
//! Transforms may contribute functions, constants and rank properties to
//! the profile being compiled through [`TransformContext`].

mod constant_tensors;
mod inliner;
mod model_import;
mod onnx_output;
mod tensor_max_min;


use indexmap::IndexMap;

pub use constant_tensors::ConstantTensorTransformer;
pub use inliner::FunctionInliner;
pub use model_import::ModelImporter;
pub use onnx_output::OnnxOutputTransformer;
pub use tensor_max_min::TensorMaxMinTransformer;

use crate::Result;
use crate::expr::{Expr, TypeResolver};
use crate::models::ImportedMlModels;
use crate::profile::{Constant, OnnxModel, RankingExpressionFunction};
use crate::reference::Reference;

pub trait ExpressionTransformer {
    fn name(&self) -> &'static str;

    fn transform(&self, expr: Expr, context: &mut TransformContext<'_>) -> Result<Expr>;
}

/// What a transform may read, and what it adds to the profile.
pub struct TransformContext<'a> {
    /// Compiled inline functions available for substitution.
    pub inline_functions: &'a IndexMap<String, RankingExpressionFunction>,
    pub constants: &'a IndexMap<Reference, Constant>,
    pub onnx_models: &'a IndexMap<String, OnnxModel>,
    pub models: &'a ImportedMlModels,
    pub types: &'a dyn TypeResolver,
    output: TransformOutput,
}

/// Additions made by transforms, applied to the profile after each step.
#[derive(Debug, Default)]
pub struct TransformOutput {
    pub functions: Vec<RankingExpressionFunction>,
    pub constants: Vec<Constant>,
    pub rank_properties: IndexMap<String, String>,
}

impl<'a> TransformContext<'a> {
    pub fn new(
        inline_functions: &'a IndexMap<String, RankingExpressionFunction>,
        constants: &'a IndexMap<Reference, Constant>,
        onnx_models: &'a IndexMap<String, OnnxModel>,
        models: &'a ImportedMlModels,
        types: &'a dyn TypeResolver,
    ) -> Self {
        Self {
            inline_functions,
            constants,
            onnx_models,
            models,
            types,
            output: TransformOutput::default(),
        }
    }

    pub fn add_function(&mut self, function: RankingExpressionFunction) {
        self.output.functions.push(function);
    }

    pub fn add_constant(&mut self, constant: Constant) {
        self.output.constants.push(constant);
    }

    pub fn add_rank_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.output.rank_properties.insert(name.into(), value.into());
    }

    /// The constant `reference` names, written either as `constant(name)`
    /// or as a bare name.
    pub fn constant(&self, reference: &Reference) -> Option<&'a Constant> {
        if let Some(constant) = self.constants.get(reference) {
            return Some(constant);
        }
        if reference.is_identifier() {
            return self
                .constants
                .values()
                .find(|constant| constant.name() == reference.name());
        }
        None
    }

    pub fn output(&self) -> &TransformOutput {
        &self.output
    }

    pub fn into_output(self) -> TransformOutput {
        self.output
    }
}

/// Ordered transform pipeline.
pub struct ExpressionTransforms {
    transforms: Vec<Box<dyn ExpressionTransformer>>,
}

impl Default for ExpressionTransforms {
    fn default() -> Self {
        Self::new(vec![
            Box::new(OnnxOutputTransformer),
            Box::new(ModelImporter),
            Box::new(FunctionInliner),
            Box::new(TensorMaxMinTransformer),
            Box::new(ConstantTensorTransformer),
        ])
    }
}

impl ExpressionTransforms {
    pub fn new(transforms: Vec<Box<dyn ExpressionTransformer>>) -> Self {
        Self { transforms }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn transform(&self, expr: Expr, context: &mut TransformContext<'_>) -> Result<Expr> {
        self.transforms
            .iter()
            .try_fold(expr, |expr, transformer| transformer.transform(expr, context))
    }
}

/// Rebuild `expr` bottom-up, passing each node to `f` once its children
/// have been rewritten.
pub(crate) fn rewrite_post_order(
    expr: Expr,
    f: &mut impl FnMut(Expr) -> Result<Expr>,
) -> Result<Expr> {
    let expr = expr.map_children(&mut |child| rewrite_post_order(child, f))?;
    f(expr)
}

/// `expr` wrapped in parentheses when it could bind differently once
/// substituted into a larger expression.
pub(crate) fn as_operand(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { .. } | Expr::Unary { .. } => expr.embrace(),
        other => other,
    }
}
