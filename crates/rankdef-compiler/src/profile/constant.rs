use rankdef_core::TensorType;

use crate::reference::Reference;
use crate::reference::feature_names::as_constant_feature;
use crate::resources::{DistributableResource, FileReference};
use crate::{Error, Result};

/// Where a constant's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    /// Tensor literal or number written in the profile.
    Inline(String),
    /// File in the application package.
    File(String),
    Uri(String),
}

/// A named constant tensor, referenced as `constant(name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    name: String,
    tensor_type: TensorType,
    value: ConstantValue,
    file_reference: Option<FileReference>,
}

impl Constant {
    /// Dense dimensions of a constant must have a size.
    pub fn new(
        name: impl Into<String>,
        tensor_type: TensorType,
        value: ConstantValue,
    ) -> Result<Self> {
        let name = name.into();
        if tensor_type.has_unbound_indexed() {
            return Err(Error::UnboundConstant { name, tensor_type });
        }
        Ok(Self {
            name,
            tensor_type,
            value,
            file_reference: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `constant(name)`
    pub fn reference(&self) -> Reference {
        as_constant_feature(&self.name)
    }

    pub fn tensor_type(&self) -> &TensorType {
        &self.tensor_type
    }

    pub fn value(&self) -> &ConstantValue {
        &self.value
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.value, ConstantValue::Inline(_))
    }
}

impl DistributableResource for Constant {
    const KIND: &'static str = "ranking constant";

    fn name(&self) -> &str {
        &self.name
    }

    fn content(&self) -> &[u8] {
        match &self.value {
            ConstantValue::Inline(v) | ConstantValue::File(v) | ConstantValue::Uri(v) => v.as_bytes(),
        }
    }

    fn validate(&self) -> Result<()> {
        match &self.value {
            ConstantValue::Inline(_) => Err(Error::InvalidResource {
                kind: Self::KIND,
                name: self.name.clone(),
                reason: "inline constants are not distributed as files".into(),
            }),
            ConstantValue::File(path) | ConstantValue::Uri(path) if path.trim().is_empty() => {
                Err(Error::InvalidResource {
                    kind: Self::KIND,
                    name: self.name.clone(),
                    reason: "no file or uri given".into(),
                })
            }
            _ => Ok(()),
        }
    }

    fn file_reference(&self) -> Option<&FileReference> {
        self.file_reference.as_ref()
    }

    fn set_file_reference(&mut self, reference: FileReference) {
        self.file_reference = Some(reference);
    }
}
