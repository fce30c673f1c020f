//! Compiler settings, read from a JSON file or set with the `with_*` builders.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Expression text longer than this is shipped as a file instead of inline.
pub const DEFAULT_LARGE_EXPRESSION_THRESHOLD: usize = 8192;
/// Largest blob accepted by the resource registries.
pub const DEFAULT_MAX_RESOURCE_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CompilerConfig {
    pub large_expression_threshold: usize,
    pub max_resource_size: usize,
    pub warn_undeclared_query_features: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            large_expression_threshold: DEFAULT_LARGE_EXPRESSION_THRESHOLD,
            max_resource_size: DEFAULT_MAX_RESOURCE_SIZE,
            warn_undeclared_query_features: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_large_expression_threshold(mut self, bytes: usize) -> Self {
        self.large_expression_threshold = bytes;
        self
    }

    pub fn with_max_resource_size(mut self, bytes: usize) -> Self {
        self.max_resource_size = bytes;
        self
    }

    pub fn with_warn_undeclared_query_features(mut self, warn: bool) -> Self {
        self.warn_undeclared_query_features = warn;
        self
    }

    /// Parse a JSON config. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_owned(),
            message: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.large_expression_threshold > self.max_resource_size {
            return Err(Error::Config(format!(
                "large-expression-threshold ({}) exceeds max-resource-size ({})",
                self.large_expression_threshold, self.max_resource_size
            )));
        }
        Ok(())
    }
}
