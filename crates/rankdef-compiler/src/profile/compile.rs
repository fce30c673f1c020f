//! Compilation of a rank profile.
//!
//! Steps, on the profile's inherited view:
//! 1. reject functions named like constants
//! 2. collect declared feature types (inputs, attributes, constants, ONNX
//!    outputs, query profile fields)
//! 3. compile inline zero-argument functions without inlining
//! 4. compile the phase expressions, inlining the functions from step 3
//! 5. compile every function, including those transforms add on the way
//! 6. turn the inputs of the global phase into match features
//! 7. type check the result

use std::collections::{HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use rankdef_core::TensorType;

use super::ProfileRef;
use super::compiled::CompiledRankProfile;
use super::constant::Constant;
use super::function::RankingExpressionFunction;
use super::input::Input;
use super::onnx::OnnxModel;
use super::registry::RankProfileRegistry;
use super::tuning::RankProperty;
use crate::analyze::{FunctionTable, TypeContext, global_phase_inputs};
use crate::config::CompilerConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::expr::{Expr, RankingExpression, TypeResolver};
use crate::models::ImportedMlModels;
use crate::query_profiles::QueryProfileRegistry;
use crate::reference::Reference;
use crate::schema::Schema;
use crate::transform::{ExpressionTransforms, TransformContext};
use crate::{Error, Result};

/// Application-wide inputs to compiling a profile.
#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    pub query_profiles: &'a QueryProfileRegistry,
    pub models: &'a ImportedMlModels,
    pub config: &'a CompilerConfig,
}

impl<'a> CompileContext<'a> {
    pub fn new(
        query_profiles: &'a QueryProfileRegistry,
        models: &'a ImportedMlModels,
        config: &'a CompilerConfig,
    ) -> Self {
        Self {
            query_profiles,
            models,
            config,
        }
    }
}

/// Compile every profile in the registry, in registration order.
pub fn compile_all(
    registry: &RankProfileRegistry,
    context: &CompileContext<'_>,
) -> Result<Vec<CompiledRankProfile>> {
    registry
        .profiles()
        .map(|profile| profile.compile(context))
        .collect()
}

impl ProfileRef<'_> {
    /// Compile this profile. Any failure is reported as
    /// [`Error::ProfileInvalid`] naming the profile.
    pub fn compile(&self, context: &CompileContext<'_>) -> Result<CompiledRankProfile> {
        let _span = tracing::debug_span!(
            "compile",
            profile = %self.name(),
            owner = %self.owner()
        )
        .entered();
        compile(*self, context).map_err(|source| Error::ProfileInvalid {
            profile: self.name().to_owned(),
            source: Box::new(source),
        })
    }
}

fn compile(profile: ProfileRef<'_>, context: &CompileContext<'_>) -> Result<CompiledRankProfile> {
    let functions = profile.functions()?;
    let constants = profile.constants()?;
    check_name_collisions(&functions, &constants)?;
    let inputs = profile.inputs()?;
    let onnx_models = profile.onnx_models()?;
    let feature_types = feature_types(
        profile.schema(),
        &inputs,
        &constants,
        &onnx_models,
        context.query_profiles,
    )?;

    let types = TypeContext::new(function_table(functions.values()));
    declare(&types, &feature_types);

    let mut state = CompileState {
        profile: profile.name().to_owned(),
        constants,
        onnx_models,
        models: context.models,
        transforms: ExpressionTransforms::default(),
        worklist: VecDeque::new(),
        queued: HashSet::new(),
        rank_properties: IndexMap::new(),
    };
    for function in functions.values() {
        state.enqueue(function.clone());
    }

    let no_inlining = IndexMap::new();
    let mut inline_functions = IndexMap::new();
    for function in functions
        .values()
        .filter(|f| f.inline && f.arguments().is_empty())
    {
        let body = state.transform(function.body().clone(), &no_inlining, &types)?;
        inline_functions.insert(function.name().to_owned(), function.with_body(body));
    }

    let first_phase = state.compile_phase(profile.first_phase()?, &inline_functions, &types)?;
    let second_phase = state.compile_phase(profile.second_phase()?, &inline_functions, &types)?;
    let global_phase = state.compile_phase(profile.global_phase()?, &inline_functions, &types)?;

    let mut compiled_functions = IndexMap::new();
    while let Some(function) = state.worklist.pop_front() {
        let body = state.transform(function.body().clone(), &inline_functions, &types)?;
        tracing::debug!(function = function.name(), "compiled function");
        compiled_functions.insert(function.name().to_owned(), function.with_body(body));
    }

    let mut match_features = profile.match_features()?.unwrap_or_default();
    if let Some(global_phase) = &global_phase {
        let constant_names: IndexSet<String> = state
            .constants
            .values()
            .map(|c| c.name().to_owned())
            .collect();
        let table = function_table(compiled_functions.values());
        let discovered =
            global_phase_inputs(&global_phase.root, &table, &match_features, &constant_names);
        for input in discovered {
            let feature = Reference::parse(&input)
                .map_err(|_| Error::InvalidGlobalPhaseInput(input.clone()))?;
            tracing::debug!(feature = %feature, "global-phase input added as match feature");
            match_features.insert(feature);
        }
    }
    let summary_features = profile.summary_features()?.unwrap_or_default();

    let checked = TypeContext::new(function_table(compiled_functions.values()));
    declare(&checked, &feature_types);
    for constant in state.constants.values() {
        checked.set_type(constant.reference(), constant.tensor_type().clone());
    }
    for (phase, description) in [
        (&first_phase, "first-phase expression"),
        (&second_phase, "second-phase expression"),
        (&global_phase, "global-phase expression"),
    ] {
        if let Some(phase) = phase {
            let actual = phase.root.type_of(&checked)?;
            if !actual.is_scalar() {
                return Err(Error::NotScalar {
                    context: description.to_owned(),
                    actual,
                });
            }
        }
    }
    let mut function_types = IndexMap::new();
    for function in compiled_functions
        .values()
        .filter(|f| f.arguments().is_empty())
    {
        let tensor_type = checked.get_type(&Reference::identifier(function.name()))?;
        function_types.insert(function.name().to_owned(), tensor_type);
    }
    for feature in summary_features.iter().chain(&match_features) {
        checked.get_type(feature)?;
    }

    let query_features_not_declared = checked.query_features_not_declared();
    let tuning = profile.tuning()?;
    if tuning.strict == Some(true)
        && let Some(feature) = query_features_not_declared.first()
    {
        return Err(Error::invalid(format!(
            "{feature} is not declared in a query profile type or as an input, \
             which is required in strict mode"
        )));
    }
    let mut diagnostics = Diagnostics::new();
    if context.config.warn_undeclared_query_features && checked.tensors_are_used() {
        for feature in &query_features_not_declared {
            tracing::warn!(
                profile = profile.name(),
                feature = %feature,
                "query feature is not declared, assuming a scalar"
            );
            diagnostics
                .report(DiagnosticKind::UndeclaredQueryFeature)
                .profile(profile.name())
                .message(format!(
                    "{feature} is not declared in a query profile type or as an input, \
                     and will be interpreted as a scalar"
                ))
                .emit();
        }
    }

    let mut rank_properties: Vec<RankProperty> =
        profile.rank_properties()?.into_values().flatten().collect();
    for (name, value) in state.rank_properties {
        let property = RankProperty::new(name, value);
        if !rank_properties.contains(&property) {
            rank_properties.push(property);
        }
    }

    tracing::debug!(
        functions = compiled_functions.len(),
        resolutions = checked.resolutions(),
        "compiled rank profile"
    );

    Ok(CompiledRankProfile {
        name: profile.name().to_owned(),
        owner: profile.owner().clone(),
        first_phase,
        second_phase,
        global_phase,
        functions: compiled_functions,
        function_types,
        constants: state.constants,
        inputs,
        onnx_models: state.onnx_models,
        feature_types,
        tuning,
        summary_features,
        match_features,
        rank_features: profile.rank_features()?.unwrap_or_default(),
        rank_settings: profile.rank_settings()?.into_values().collect(),
        filter_fields: profile.filter_fields()?,
        rank_properties,
        query_features_not_declared,
        diagnostics,
    })
}

/// Mutable state of one compilation.
struct CompileState<'c> {
    profile: String,
    constants: IndexMap<Reference, Constant>,
    onnx_models: IndexMap<String, OnnxModel>,
    models: &'c ImportedMlModels,
    transforms: ExpressionTransforms,
    /// Functions still to compile. A name is queued at most once.
    worklist: VecDeque<RankingExpressionFunction>,
    queued: HashSet<String>,
    rank_properties: IndexMap<String, String>,
}

impl CompileState<'_> {
    fn enqueue(&mut self, function: RankingExpressionFunction) {
        if self.queued.insert(function.name().to_owned()) {
            self.worklist.push_back(function);
        }
    }

    fn compile_phase(
        &mut self,
        phase: Option<RankingExpression>,
        inline_functions: &IndexMap<String, RankingExpressionFunction>,
        types: &dyn TypeResolver,
    ) -> Result<Option<RankingExpression>> {
        let Some(phase) = phase else {
            return Ok(None);
        };
        let root = self.transform(phase.root, inline_functions, types)?;
        tracing::debug!(phase = %phase.name, "compiled phase expression");
        Ok(Some(RankingExpression::new(phase.name, root)))
    }

    fn transform(
        &mut self,
        expr: Expr,
        inline_functions: &IndexMap<String, RankingExpressionFunction>,
        types: &dyn TypeResolver,
    ) -> Result<Expr> {
        let mut context = TransformContext::new(
            inline_functions,
            &self.constants,
            &self.onnx_models,
            self.models,
            types,
        );
        let expr = self.transforms.transform(expr, &mut context)?;
        let output = context.into_output();

        for function in output.functions {
            self.enqueue(function);
        }
        for constant in output.constants {
            self.add_constant(constant)?;
        }
        self.rank_properties.extend(output.rank_properties);
        Ok(expr)
    }

    fn add_constant(&mut self, constant: Constant) -> Result<()> {
        let reference = constant.reference();
        match self.constants.get(&reference) {
            Some(existing) if *existing != constant => Err(Error::DuplicateDefinition {
                profile: self.profile.clone(),
                kind: "constant",
                name: constant.name().to_owned(),
            }),
            Some(_) => Ok(()),
            None => {
                self.constants.insert(reference, constant);
                Ok(())
            }
        }
    }
}

/// A function and a constant may not share a name: a bare reference to
/// it would be ambiguous.
fn check_name_collisions(
    functions: &IndexMap<String, RankingExpressionFunction>,
    constants: &IndexMap<Reference, Constant>,
) -> Result<()> {
    match constants
        .values()
        .find(|constant| functions.contains_key(constant.name()))
    {
        Some(constant) => Err(Error::NameCollision(constant.name().to_owned())),
        None => Ok(()),
    }
}

/// Every feature type the profile declares. Inputs take precedence over
/// query profile fields for the same feature.
fn feature_types(
    schema: Option<&Schema>,
    inputs: &IndexMap<Reference, Input>,
    constants: &IndexMap<Reference, Constant>,
    onnx_models: &IndexMap<String, OnnxModel>,
    query_profiles: &QueryProfileRegistry,
) -> Result<IndexMap<Reference, TensorType>> {
    let mut types = IndexMap::new();
    if let Some(schema) = schema {
        types.extend(schema.attribute_types());
    }
    for constant in constants.values() {
        types.insert(constant.reference(), constant.tensor_type().clone());
    }
    for model in onnx_models.values() {
        types.extend(model.feature_types());
    }
    for (feature, tensor_type) in query_profiles.feature_types()? {
        if !inputs.contains_key(&feature) {
            types.insert(feature, tensor_type);
        }
    }
    for input in inputs.values() {
        types.insert(input.name.clone(), input.tensor_type.clone());
    }
    Ok(types)
}

fn function_table<'f>(
    functions: impl Iterator<Item = &'f RankingExpressionFunction>,
) -> FunctionTable {
    functions
        .map(|f| (f.name().to_owned(), f.function.clone()))
        .collect()
}

fn declare(types: &TypeContext<'_>, feature_types: &IndexMap<Reference, TensorType>) {
    for (feature, tensor_type) in feature_types {
        types.set_type(feature.clone(), tensor_type.clone());
    }
}
