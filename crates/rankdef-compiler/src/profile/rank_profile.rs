//! The rank profile as declared, before inheritance is applied.
//!
//! Mutators record local declarations only. The effective view, with
//! everything inherited, is read through [`super::ProfileRef`].

use std::cell::RefCell;

use indexmap::{IndexMap, IndexSet};
use rankdef_core::TensorType;

use super::constant::Constant;
use super::function::RankingExpressionFunction;
use super::input::Input;
use super::onnx::OnnxModel;
use super::registry::{Owner, ProfileId};
use super::tuning::{RankProperty, RankSetting, RankSettingKey, Tuning};
use crate::expr::RankingExpression;
use crate::reference::{FeatureList, Reference};
use crate::{Error, Result};

/// Names that may be redeclared within one owner, replacing the earlier profile.
pub const OVERRIDABLE_NAMES: [&str; 2] = ["default", "unranked"];

pub const FIRST_PHASE: &str = "firstphase";
pub const SECOND_PHASE: &str = "secondphase";
pub const GLOBAL_PHASE: &str = "globalphase";

#[derive(Debug, Clone, Default)]
pub(crate) enum InheritanceState {
    #[default]
    Unresolved,
    Resolving,
    Resolved(Vec<ProfileId>),
}

#[derive(Debug)]
pub struct RankProfile {
    pub(crate) name: String,
    pub(crate) owner: Owner,
    pub(crate) builtin: bool,
    pub(crate) inherited_names: Vec<String>,
    pub(crate) inheritance: RefCell<InheritanceState>,

    pub(crate) first_phase: Option<RankingExpression>,
    pub(crate) second_phase: Option<RankingExpression>,
    pub(crate) global_phase: Option<RankingExpression>,
    pub(crate) functions: IndexMap<String, RankingExpressionFunction>,
    pub(crate) constants: IndexMap<Reference, Constant>,
    pub(crate) inputs: IndexMap<Reference, Input>,
    pub(crate) onnx_models: IndexMap<String, OnnxModel>,
    pub(crate) tuning: Tuning,

    pub(crate) summary_features: Option<IndexSet<Reference>>,
    pub(crate) inherited_summary_features: Option<String>,
    pub(crate) match_features: Option<IndexSet<Reference>>,
    pub(crate) inherited_match_features: Option<String>,
    pub(crate) rank_features: Option<IndexSet<Reference>>,
    pub(crate) rank_settings: IndexMap<RankSettingKey, RankSetting>,
    pub(crate) filter_fields: IndexSet<String>,
    pub(crate) rank_properties: IndexMap<String, Vec<RankProperty>>,
}

impl RankProfile {
    pub fn new(name: impl Into<String>, owner: Owner) -> Self {
        Self {
            name: name.into(),
            owner,
            builtin: false,
            inherited_names: Vec::new(),
            inheritance: RefCell::default(),
            first_phase: None,
            second_phase: None,
            global_phase: None,
            functions: IndexMap::new(),
            constants: IndexMap::new(),
            inputs: IndexMap::new(),
            onnx_models: IndexMap::new(),
            tuning: Tuning::default(),
            summary_features: None,
            inherited_summary_features: None,
            match_features: None,
            inherited_match_features: None,
            rank_features: None,
            rank_settings: IndexMap::new(),
            filter_fields: IndexSet::new(),
            rank_properties: IndexMap::new(),
        }
    }

    /// The implicit `default` profile of a schema: no declarations at all.
    pub fn builtin_default(owner: Owner) -> Self {
        let mut profile = Self::new("default", owner);
        profile.builtin = true;
        profile
    }

    /// The implicit `unranked` profile: constant score, no reranking.
    pub fn builtin_unranked(owner: Owner) -> Self {
        let mut profile = Self::new("unranked", owner);
        profile.builtin = true;
        profile.first_phase = Some(RankingExpression::new(FIRST_PHASE, crate::Expr::number(0.0)));
        profile.tuning.keep_rank_count = Some(0);
        profile.tuning.rerank_count = Some(0);
        profile
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn is_overridable(&self) -> bool {
        OVERRIDABLE_NAMES.contains(&self.name.as_str())
    }

    pub fn inherited_names(&self) -> &[String] {
        &self.inherited_names
    }

    pub fn inherit(&mut self, name: impl Into<String>) {
        self.inherited_names.push(name.into());
        *self.inheritance.borrow_mut() = InheritanceState::Unresolved;
    }

    pub fn set_first_phase(&mut self, text: &str) -> Result<()> {
        self.first_phase = Some(RankingExpression::parse(FIRST_PHASE, text)?);
        Ok(())
    }

    pub fn set_second_phase(&mut self, text: &str) -> Result<()> {
        self.second_phase = Some(RankingExpression::parse(SECOND_PHASE, text)?);
        Ok(())
    }

    pub fn set_global_phase(&mut self, text: &str) -> Result<()> {
        self.global_phase = Some(RankingExpression::parse(GLOBAL_PHASE, text)?);
        Ok(())
    }

    pub fn add_function(&mut self, function: RankingExpressionFunction) -> Result<()> {
        if self.functions.contains_key(function.name()) {
            return Err(self.duplicate("function", function.name()));
        }
        self.functions.insert(function.name().to_owned(), function);
        Ok(())
    }

    pub fn add_constant(&mut self, constant: Constant) -> Result<()> {
        let reference = constant.reference();
        if let Some(existing) = self.constants.get(&reference)
            && existing != &constant
        {
            return Err(self.duplicate("constant", constant.name()));
        }
        self.constants.insert(reference, constant);
        Ok(())
    }

    pub fn add_input(&mut self, input: Input) -> Result<()> {
        if let Some(existing) = self.inputs.get(&input.name)
            && existing != &input
        {
            return Err(self.duplicate("input", &input.name.to_string()));
        }
        self.inputs.insert(input.name.clone(), input);
        Ok(())
    }

    /// Declare a `query(name)` input of the given type.
    pub fn add_query_input(&mut self, name: &str, tensor_type: TensorType) -> Result<()> {
        self.add_input(Input::new(
            crate::reference::feature_names::as_query_feature(name),
            tensor_type,
        ))
    }

    pub fn add_onnx_model(&mut self, model: OnnxModel) -> Result<()> {
        if self.onnx_models.contains_key(model.name()) {
            return Err(self.duplicate("onnx model", model.name()));
        }
        self.onnx_models.insert(model.name().to_owned(), model);
        Ok(())
    }

    pub fn tuning_mut(&mut self) -> &mut Tuning {
        &mut self.tuning
    }

    pub fn add_summary_features(&mut self, features: FeatureList) {
        self.summary_features
            .get_or_insert_with(IndexSet::new)
            .extend(features);
    }

    /// Also include the summary features of `parent`, which must be a
    /// directly inherited profile.
    pub fn set_inherited_summary_features(&mut self, parent: &str) -> Result<()> {
        self.check_direct_parent(parent, "summary features")?;
        self.inherited_summary_features = Some(parent.to_owned());
        Ok(())
    }

    pub fn add_match_features(&mut self, features: FeatureList) {
        self.match_features
            .get_or_insert_with(IndexSet::new)
            .extend(features);
    }

    pub fn set_inherited_match_features(&mut self, parent: &str) -> Result<()> {
        self.check_direct_parent(parent, "match features")?;
        self.inherited_match_features = Some(parent.to_owned());
        Ok(())
    }

    pub fn add_rank_features(&mut self, features: FeatureList) {
        self.rank_features
            .get_or_insert_with(IndexSet::new)
            .extend(features);
    }

    /// Add or replace the setting for the same field and kind.
    pub fn add_rank_setting(&mut self, setting: RankSetting) {
        self.rank_settings.insert(setting.key(), setting);
    }

    pub fn add_filter_field(&mut self, field: impl Into<String>) {
        self.filter_fields.insert(field.into());
    }

    pub fn add_rank_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let property = RankProperty::new(name, value);
        self.rank_properties
            .entry(property.name.clone())
            .or_default()
            .push(property);
    }

    fn check_direct_parent(&self, parent: &str, what: &'static str) -> Result<()> {
        if self.inherited_names.iter().any(|name| name == parent) {
            return Ok(());
        }
        Err(Error::NotDirectlyInherited {
            profile: self.name.clone(),
            parent: parent.to_owned(),
            what,
        })
    }

    fn duplicate(&self, kind: &'static str, name: &str) -> Error {
        Error::DuplicateDefinition {
            profile: self.name.clone(),
            kind,
            name: name.to_owned(),
        }
    }
}
