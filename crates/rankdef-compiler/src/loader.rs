//! Building an application from a JSON description.
//!
//! The description lists schemas (with their fields and rank profiles),
//! global rank profiles, query profile types and imported models. Loading
//! registers everything, distributes file-backed constants and ONNX models
//! and leaves compilation to the caller.
//!
//! Expression values may be written inline or as `file:name`, which reads
//! `name.expression` through the owning schema.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rankdef_core::TensorType;
use rankdef_core::utils::is_identifier;
use serde::Deserialize;

use crate::config::CompilerConfig;
use crate::derive::derive;
use crate::expr::Expr;
use crate::models::{ImportedMlModel, ImportedMlModels, ModelKind};
use crate::profile::{
    CompileContext, CompiledRankProfile, Constant, ConstantValue, ExecutionHints, Input, OnnxModel,
    Owner, RankProfile, RankProfileRegistry, RankProperty, RankSetting, RankSettingKind,
    RankingExpressionFunction, Tuning, compile_all,
};
use crate::query_profiles::{QueryProfileRegistry, QueryProfileType};
use crate::reference::Reference;
use crate::reference::feature_names::{FeatureList, as_query_feature};
use crate::resources::{
    InMemoryFileRegistry, LargeRankingExpressions, OnnxModels, RankingConstants,
};
use crate::schema::{Attribute, Field, ImportedField, Schema};
use crate::{Error, Result};

const FILE_PREFIX: &str = "file:";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ApplicationDescription {
    pub schemas: Vec<SchemaDescription>,
    pub rank_profiles: Vec<ProfileDescription>,
    pub query_profile_types: Vec<QueryProfileTypeDescription>,
    pub models: Vec<ModelDescription>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SchemaDescription {
    pub name: String,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
    #[serde(default)]
    pub imported_fields: Vec<ImportedFieldDescription>,
    /// Directory of expression files, relative to the description file.
    #[serde(default)]
    pub expression_dir: Option<PathBuf>,
    /// Expression files given inline, by name.
    #[serde(default)]
    pub expressions: IndexMap<String, String>,
    #[serde(default)]
    pub rank_profiles: Vec<ProfileDescription>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FieldDescription {
    pub name: String,
    /// `int`, `double`, `string`, ... or a tensor type.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub attribute: bool,
    #[serde(default)]
    pub attribute_name: Option<String>,
    #[serde(default)]
    pub indexed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ImportedFieldDescription {
    pub name: String,
    pub reference_field: String,
    pub target_field: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProfileDescription {
    pub name: String,
    pub inherits: Vec<String>,
    pub first_phase: Option<String>,
    pub second_phase: Option<String>,
    pub global_phase: Option<String>,
    pub functions: Vec<FunctionDescription>,
    pub constants: Vec<ConstantDescription>,
    pub inputs: Vec<InputDescription>,
    pub onnx_models: Vec<OnnxModelDescription>,
    pub tuning: Tuning,
    pub summary_features: Option<String>,
    pub summary_features_inherits: Option<String>,
    pub match_features: Option<String>,
    pub match_features_inherits: Option<String>,
    pub rank_features: Option<String>,
    pub rank_settings: Vec<RankSettingDescription>,
    pub filter_fields: Vec<String>,
    pub rank_properties: Vec<RankPropertyDescription>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FunctionDescription {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    pub expression: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConstantDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub tensor_type: TensorType,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InputDescription {
    /// `query(name)`, or a bare name meaning the same.
    pub name: String,
    #[serde(rename = "type")]
    pub tensor_type: TensorType,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OnnxModelDescription {
    pub name: String,
    pub file: String,
    #[serde(default)]
    pub inputs: IndexMap<String, String>,
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
    #[serde(default)]
    pub output_types: IndexMap<String, TensorType>,
    #[serde(default)]
    pub gpu_device: Option<u32>,
    #[serde(default)]
    pub intra_op_threads: Option<u32>,
    #[serde(default)]
    pub inter_op_threads: Option<u32>,
    #[serde(default)]
    pub execution_mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RankSettingDescription {
    pub field: String,
    pub kind: RankSettingKind,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RankPropertyDescription {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct QueryProfileTypeDescription {
    pub id: String,
    #[serde(default)]
    pub fields: IndexMap<String, TensorType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModelDescription {
    pub name: String,
    pub kind: String,
    pub expression: String,
    #[serde(default)]
    pub functions: Vec<FunctionDescription>,
    #[serde(default)]
    pub constants: Vec<ConstantDescription>,
}

impl ApplicationDescription {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Description(e.to_string()))
    }
}

/// A loaded application: every rank profile registered, ready to compile.
pub struct Application {
    registry: RankProfileRegistry,
    query_profiles: QueryProfileRegistry,
    models: ImportedMlModels,
    config: CompilerConfig,
    file_registry: Arc<InMemoryFileRegistry>,
    expressions: LargeRankingExpressions,
    constants: RankingConstants,
    onnx_models: OnnxModels,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Load the description at `path`. Expression directories are
    /// resolved relative to the file's directory.
    pub fn load(path: &Path, config: CompilerConfig) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_owned(),
            message: e.to_string(),
        })?;
        let description = ApplicationDescription::from_json(&text)?;
        Self::from_description(description, path.parent(), config)
    }

    pub fn from_json(text: &str, config: CompilerConfig) -> Result<Self> {
        Self::from_description(ApplicationDescription::from_json(text)?, None, config)
    }

    pub fn from_description(
        description: ApplicationDescription,
        base_dir: Option<&Path>,
        config: CompilerConfig,
    ) -> Result<Self> {
        let file_registry = Arc::new(InMemoryFileRegistry::new());
        let mut application = Self {
            registry: RankProfileRegistry::new(),
            query_profiles: QueryProfileRegistry::new(),
            models: ImportedMlModels::new(),
            expressions: LargeRankingExpressions::new(
                file_registry.clone(),
                config.max_resource_size,
            ),
            constants: RankingConstants::new(file_registry.clone(), config.max_resource_size),
            onnx_models: OnnxModels::new(file_registry.clone(), config.max_resource_size),
            file_registry,
            config,
        };

        for query_profile_type in &description.query_profile_types {
            let mut profile_type = QueryProfileType::new(&query_profile_type.id);
            for (name, tensor_type) in &query_profile_type.fields {
                profile_type = profile_type.with_field(name, tensor_type.clone());
            }
            application.query_profiles.add(profile_type);
        }
        for model in &description.models {
            let model = application.load_model(model)?;
            application.models.add(model);
        }
        for schema in &description.schemas {
            application.registry.add_schema(load_schema(schema, base_dir)?)?;
        }
        for schema in &description.schemas {
            let owner = Owner::schema(&schema.name);
            for profile in &schema.rank_profiles {
                application.add_profile(profile, &owner)?;
            }
        }
        for profile in &description.rank_profiles {
            application.add_profile(profile, &Owner::Global)?;
        }

        tracing::debug!(
            schemas = description.schemas.len(),
            profiles = application.registry.len(),
            "loaded application"
        );
        Ok(application)
    }

    pub fn registry(&self) -> &RankProfileRegistry {
        &self.registry
    }

    pub fn query_profiles(&self) -> &QueryProfileRegistry {
        &self.query_profiles
    }

    pub fn models(&self) -> &ImportedMlModels {
        &self.models
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn file_registry(&self) -> &InMemoryFileRegistry {
        &self.file_registry
    }

    pub fn expressions(&self) -> &LargeRankingExpressions {
        &self.expressions
    }

    pub fn constants(&self) -> &RankingConstants {
        &self.constants
    }

    pub fn onnx_models(&self) -> &OnnxModels {
        &self.onnx_models
    }

    pub fn compile_context(&self) -> CompileContext<'_> {
        CompileContext::new(&self.query_profiles, &self.models, &self.config)
    }

    pub fn compile_all(&self) -> Result<Vec<CompiledRankProfile>> {
        compile_all(&self.registry, &self.compile_context())
    }

    pub fn derive(&self, profile: &CompiledRankProfile) -> Result<Vec<RankProperty>> {
        derive(profile, &self.expressions, &self.config)
    }

    fn add_profile(&mut self, description: &ProfileDescription, owner: &Owner) -> Result<()> {
        let schema = owner.schema_name().and_then(|name| self.registry.schema(name));
        let profile = self.build_profile(description, owner, schema)?;
        self.registry.add(profile)?;
        Ok(())
    }

    fn build_profile(
        &self,
        description: &ProfileDescription,
        owner: &Owner,
        schema: Option<&Schema>,
    ) -> Result<RankProfile> {
        let mut profile = RankProfile::new(&description.name, owner.clone());
        for parent in &description.inherits {
            profile.inherit(parent);
        }
        let expression = |text: &str| expression_text(text, schema);

        if let Some(text) = &description.first_phase {
            profile.set_first_phase(&expression(text)?)?;
        }
        if let Some(text) = &description.second_phase {
            profile.set_second_phase(&expression(text)?)?;
        }
        if let Some(text) = &description.global_phase {
            profile.set_global_phase(&expression(text)?)?;
        }
        for function in &description.functions {
            profile.add_function(load_function(function, schema)?)?;
        }
        for constant in &description.constants {
            profile.add_constant(self.load_constant(constant)?)?;
        }
        for input in &description.inputs {
            profile.add_input(load_input(input)?)?;
        }
        for model in &description.onnx_models {
            profile.add_onnx_model(self.load_onnx_model(model)?)?;
        }
        *profile.tuning_mut() = description.tuning.clone();

        if let Some(text) = &description.summary_features {
            profile.add_summary_features(FeatureList::parse(text)?);
        }
        if let Some(parent) = &description.summary_features_inherits {
            profile.set_inherited_summary_features(parent)?;
        }
        if let Some(text) = &description.match_features {
            profile.add_match_features(FeatureList::parse(text)?);
        }
        if let Some(parent) = &description.match_features_inherits {
            profile.set_inherited_match_features(parent)?;
        }
        if let Some(text) = &description.rank_features {
            profile.add_rank_features(FeatureList::parse(text)?);
        }
        for setting in &description.rank_settings {
            profile.add_rank_setting(RankSetting::new(
                &setting.field,
                setting.kind,
                &setting.value,
            ));
        }
        for field in &description.filter_fields {
            profile.add_filter_field(field);
        }
        for property in &description.rank_properties {
            profile.add_rank_property(&property.name, &property.value);
        }
        Ok(profile)
    }

    /// File-backed constants are distributed; the registered value, carrying
    /// its file reference, is what profiles hold.
    fn load_constant(&self, description: &ConstantDescription) -> Result<Constant> {
        let constant = parse_constant(description)?;
        if constant.is_inline() {
            return Ok(constant);
        }
        self.constants.add(constant)
    }

    fn load_onnx_model(&self, description: &OnnxModelDescription) -> Result<OnnxModel> {
        let mut model = OnnxModel::new(&description.name, &description.file).with_hints(
            ExecutionHints {
                gpu_device: description.gpu_device,
                intra_op_threads: description.intra_op_threads,
                inter_op_threads: description.inter_op_threads,
                execution_mode: description.execution_mode.clone(),
            },
        );
        for (model_input, source) in &description.inputs {
            model = model.with_input(model_input, source);
        }
        for (model_output, alias) in &description.outputs {
            model = model.with_output(model_output, alias);
        }
        for (output, tensor_type) in &description.output_types {
            model = model.with_output_type(output, tensor_type.clone());
        }
        self.onnx_models.add(model)
    }

    fn load_model(&self, description: &ModelDescription) -> Result<ImportedMlModel> {
        let kind = ModelKind::from_feature_name(&description.kind).ok_or_else(|| {
            Error::Description(format!(
                "model '{}' has unknown kind '{}'",
                description.name, description.kind
            ))
        })?;
        let mut model =
            ImportedMlModel::new(&description.name, kind, Expr::parse(&description.expression)?);
        for function in &description.functions {
            model = model.with_function(load_function(function, None)?);
        }
        for constant in &description.constants {
            model = model.with_constant(self.load_constant(constant)?);
        }
        Ok(model)
    }
}

fn load_schema(description: &SchemaDescription, base_dir: Option<&Path>) -> Result<Schema> {
    let mut schema = Schema::new(&description.name);
    for parent in &description.inherits {
        schema = schema.inheriting(parent);
    }
    for field in &description.fields {
        let mut loaded = Field::new(&field.name, field_type(&field.field_type)?);
        if field.attribute {
            loaded = match &field.attribute_name {
                Some(name) => loaded.with_named_attribute(name),
                None => loaded.with_attribute(),
            };
        }
        if field.indexed {
            loaded = loaded.indexed();
        }
        schema = schema.with_field(loaded);
    }
    for imported in &description.imported_fields {
        schema = schema.with_imported_field(ImportedField::new(
            &imported.name,
            &imported.reference_field,
            Attribute::new(&imported.target_field, field_type(&imported.field_type)?),
        ));
    }
    if let Some(dir) = &description.expression_dir {
        let dir = match base_dir {
            Some(base) if dir.is_relative() => base.join(dir),
            _ => dir.clone(),
        };
        schema = schema.with_expression_dir(dir);
    }
    for (name, text) in &description.expressions {
        schema.add_expression_source(name, text);
    }
    Ok(schema)
}

fn load_function(
    description: &FunctionDescription,
    schema: Option<&Schema>,
) -> Result<RankingExpressionFunction> {
    let body = expression_text(&description.expression, schema)?;
    let arguments: Vec<&str> = description.arguments.iter().map(String::as_str).collect();
    RankingExpressionFunction::parse(&description.name, &arguments, &body, description.inline)
}

fn load_input(description: &InputDescription) -> Result<Input> {
    let name = if is_identifier(&description.name) {
        as_query_feature(&description.name)
    } else {
        Reference::parse(&description.name)?
    };
    let input = Input::new(name, description.tensor_type.clone());
    Ok(match &description.default {
        Some(value) => input.with_default(value),
        None => input,
    })
}

fn parse_constant(description: &ConstantDescription) -> Result<Constant> {
    let value = match (&description.value, &description.file, &description.uri) {
        (Some(value), None, None) => ConstantValue::Inline(value.clone()),
        (None, Some(file), None) => ConstantValue::File(file.clone()),
        (None, None, Some(uri)) => ConstantValue::Uri(uri.clone()),
        _ => {
            return Err(Error::Description(format!(
                "constant '{}' must have exactly one of value, file and uri",
                description.name
            )));
        }
    };
    Constant::new(&description.name, description.tensor_type.clone(), value)
}

/// The expression `text`, or the content of the file it names.
fn expression_text(text: &str, schema: Option<&Schema>) -> Result<String> {
    let Some(name) = text.trim().strip_prefix(FILE_PREFIX) else {
        return Ok(text.to_owned());
    };
    match schema {
        Some(schema) => schema.read_expression_file(name.trim()),
        None => Err(Error::Description(format!(
            "'{text}': expression files can only be used in schema rank profiles"
        ))),
    }
}

/// Numeric and boolean fields are scalars; tensor fields have their type;
/// anything else (strings, arrays, ...) is scalar to ranking.
fn field_type(text: &str) -> Result<TensorType> {
    if text.trim_start().starts_with("tensor") {
        return Ok(TensorType::parse(text)?);
    }
    Ok(TensorType::empty())
}
