use rankdef_core::TensorType;

use crate::reference::Reference;

/// A declared rank input, typically `query(name)`, with an optional default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Input {
    pub name: Reference,
    pub tensor_type: TensorType,
    pub default_value: Option<String>,
}

impl Input {
    pub fn new(name: Reference, tensor_type: TensorType) -> Self {
        Self {
            name,
            tensor_type,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}
