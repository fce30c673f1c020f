//! Machine-learned models already converted to ranking expressions.
//!
//! Profiles refer to them as `lightgbm("models/m.json")`,
//! `xgboost("models/m.json")` or `onnx_vespa("models/m.onnx")`; compiling
//! replaces the reference with the model's expression and brings along the
//! model's helper functions and constants.

use indexmap::IndexMap;

use crate::expr::Expr;
use crate::profile::{Constant, RankingExpressionFunction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    LightGbm,
    XgBoost,
    OnnxVespa,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::LightGbm, ModelKind::XgBoost, ModelKind::OnnxVespa];

    /// Name of the rank feature that imports a model of this kind.
    pub fn feature_name(self) -> &'static str {
        match self {
            ModelKind::LightGbm => "lightgbm",
            ModelKind::XgBoost => "xgboost",
            ModelKind::OnnxVespa => "onnx_vespa",
        }
    }

    pub fn from_feature_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.feature_name() == name)
    }
}

#[derive(Debug, Clone)]
pub struct ImportedMlModel {
    pub name: String,
    pub kind: ModelKind,
    pub expression: Expr,
    pub functions: Vec<RankingExpressionFunction>,
    pub constants: Vec<Constant>,
}

impl ImportedMlModel {
    pub fn new(name: impl Into<String>, kind: ModelKind, expression: Expr) -> Self {
        Self {
            name: name.into(),
            kind,
            expression,
            functions: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: RankingExpressionFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_constant(mut self, constant: Constant) -> Self {
        self.constants.push(constant);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMlModels {
    models: IndexMap<String, ImportedMlModel>,
}

impl ImportedMlModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, model: ImportedMlModel) {
        self.models.insert(model.name.clone(), model);
    }

    pub fn get(&self, name: &str) -> Option<&ImportedMlModel> {
        self.models.get(name)
    }

    /// The model imported from `path`, if it is of the given kind.
    pub fn get_by_path(&self, kind: ModelKind, path: &str) -> Option<&ImportedMlModel> {
        self.get(&model_name_from_path(path))
            .filter(|model| model.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// `models/ranker.json` -> `ranker`: the file name without its extension.
pub fn model_name_from_path(path: &str) -> String {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_owned(),
        _ => file_name.to_owned(),
    }
}
