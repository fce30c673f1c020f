use indexmap::{IndexMap, IndexSet};
use rankdef_core::TensorType;

use super::constant::Constant;
use super::function::RankingExpressionFunction;
use super::input::Input;
use super::onnx::OnnxModel;
use super::registry::Owner;
use super::tuning::{RankProperty, RankSetting, Tuning};
use crate::diagnostics::Diagnostics;
use crate::expr::RankingExpression;
use crate::reference::Reference;

/// A rank profile with inheritance applied, every expression transformed
/// and type checked. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledRankProfile {
    pub(crate) name: String,
    pub(crate) owner: Owner,
    pub(crate) first_phase: Option<RankingExpression>,
    pub(crate) second_phase: Option<RankingExpression>,
    pub(crate) global_phase: Option<RankingExpression>,
    pub(crate) functions: IndexMap<String, RankingExpressionFunction>,
    pub(crate) function_types: IndexMap<String, TensorType>,
    pub(crate) constants: IndexMap<Reference, Constant>,
    pub(crate) inputs: IndexMap<Reference, Input>,
    pub(crate) onnx_models: IndexMap<String, OnnxModel>,
    pub(crate) feature_types: IndexMap<Reference, TensorType>,
    pub(crate) tuning: Tuning,
    pub(crate) summary_features: IndexSet<Reference>,
    pub(crate) match_features: IndexSet<Reference>,
    pub(crate) rank_features: IndexSet<Reference>,
    pub(crate) rank_settings: Vec<RankSetting>,
    pub(crate) filter_fields: IndexSet<String>,
    pub(crate) rank_properties: Vec<RankProperty>,
    pub(crate) query_features_not_declared: Vec<Reference>,
    pub(crate) diagnostics: Diagnostics,
}

impl CompiledRankProfile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn first_phase(&self) -> Option<&RankingExpression> {
        self.first_phase.as_ref()
    }

    pub fn second_phase(&self) -> Option<&RankingExpression> {
        self.second_phase.as_ref()
    }

    pub fn global_phase(&self) -> Option<&RankingExpression> {
        self.global_phase.as_ref()
    }

    /// Compiled functions: the profile's own in declaration order, then
    /// those added while compiling.
    pub fn functions(&self) -> &IndexMap<String, RankingExpressionFunction> {
        &self.functions
    }

    /// Types of the zero-argument functions.
    pub fn function_types(&self) -> &IndexMap<String, TensorType> {
        &self.function_types
    }

    pub fn constants(&self) -> &IndexMap<Reference, Constant> {
        &self.constants
    }

    pub fn inputs(&self) -> &IndexMap<Reference, Input> {
        &self.inputs
    }

    pub fn onnx_models(&self) -> &IndexMap<String, OnnxModel> {
        &self.onnx_models
    }

    /// Declared feature types the profile was checked against.
    pub fn feature_types(&self) -> &IndexMap<Reference, TensorType> {
        &self.feature_types
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn summary_features(&self) -> &IndexSet<Reference> {
        &self.summary_features
    }

    /// Declared match features plus the inputs of the global phase.
    pub fn match_features(&self) -> &IndexSet<Reference> {
        &self.match_features
    }

    pub fn rank_features(&self) -> &IndexSet<Reference> {
        &self.rank_features
    }

    pub fn rank_settings(&self) -> &[RankSetting] {
        &self.rank_settings
    }

    pub fn filter_fields(&self) -> &IndexSet<String> {
        &self.filter_fields
    }

    pub fn rank_properties(&self) -> &[RankProperty] {
        &self.rank_properties
    }

    pub fn query_features_not_declared(&self) -> &[Reference] {
        &self.query_features_not_declared
    }

    /// Warnings raised while compiling.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
