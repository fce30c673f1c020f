use indexmap::IndexMap;
use rankdef_core::TensorType;

use crate::reference::Reference;
use crate::resources::{DistributableResource, FileReference};
use crate::{Error, Result};

/// Execution hints passed through to the model evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExecutionHints {
    pub gpu_device: Option<u32>,
    pub intra_op_threads: Option<u32>,
    pub inter_op_threads: Option<u32>,
    pub execution_mode: Option<String>,
}

/// An ONNX model evaluated as `onnx(name)` / `onnx(name).output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnnxModel {
    name: String,
    file: String,
    /// Model input name to the ranking expression that feeds it.
    inputs: IndexMap<String, String>,
    /// Model output name to the alias used in `onnx(name).alias`.
    outputs: IndexMap<String, String>,
    /// Alias to declared output type.
    output_types: IndexMap<String, TensorType>,
    hints: ExecutionHints,
    file_reference: Option<FileReference>,
}

impl OnnxModel {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            output_types: IndexMap::new(),
            hints: ExecutionHints::default(),
            file_reference: None,
        }
    }

    pub fn with_input(mut self, model_input: impl Into<String>, source: impl Into<String>) -> Self {
        self.inputs.insert(model_input.into(), source.into());
        self
    }

    pub fn with_output(mut self, model_output: impl Into<String>, alias: impl Into<String>) -> Self {
        self.outputs.insert(model_output.into(), alias.into());
        self
    }

    /// Declare the type of an output, by alias or model output name.
    pub fn with_output_type(mut self, output: impl Into<String>, tensor_type: TensorType) -> Self {
        let output = output.into();
        let alias = self.outputs.get(&output).cloned().unwrap_or(output);
        self.output_types.insert(alias, tensor_type);
        self
    }

    pub fn with_hints(mut self, hints: ExecutionHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn inputs(&self) -> &IndexMap<String, String> {
        &self.inputs
    }

    pub fn outputs(&self) -> &IndexMap<String, String> {
        &self.outputs
    }

    pub fn hints(&self) -> &ExecutionHints {
        &self.hints
    }

    /// Output used when a reference names no output: the first declared one.
    pub fn default_output(&self) -> Option<&str> {
        self.outputs
            .values()
            .next()
            .or_else(|| self.output_types.keys().next())
            .map(String::as_str)
    }

    /// Feature types contributed by this model: `onnx(name)` for the
    /// default output and `onnx(name).alias` for each typed output.
    pub fn feature_types(&self) -> Vec<(Reference, TensorType)> {
        let base = Reference::simple("onnx", &self.name);
        let mut types = Vec::new();
        if let Some(default) = self.default_output()
            && let Some(tensor_type) = self.output_types.get(default)
        {
            types.push((base.clone(), tensor_type.clone()));
        }
        for (alias, tensor_type) in &self.output_types {
            types.push((base.clone().with_output(Some(alias.clone())), tensor_type.clone()));
        }
        types
    }
}

impl DistributableResource for OnnxModel {
    const KIND: &'static str = "onnx model";

    fn name(&self) -> &str {
        &self.name
    }

    fn content(&self) -> &[u8] {
        self.file.as_bytes()
    }

    fn validate(&self) -> Result<()> {
        if self.file.trim().is_empty() {
            return Err(Error::InvalidResource {
                kind: Self::KIND,
                name: self.name.clone(),
                reason: "no model file given".into(),
            });
        }
        Ok(())
    }

    fn file_reference(&self) -> Option<&FileReference> {
        self.file_reference.as_ref()
    }

    fn set_file_reference(&mut self, reference: FileReference) {
        self.file_reference = Some(reference);
    }
}
