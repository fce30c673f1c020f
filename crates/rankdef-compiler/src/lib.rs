//! rankdef compiler: rank profile inheritance, ranking expression typing and compilation.
//!
//! This crate provides the pipeline from declared rank profiles to compiled,
//! type-checked profiles ready for configuration generation:
//! - `expr` - ranking expression lexer, parser, printer and type rules
//! - `reference` - canonical feature references and feature-name helpers
//! - `analyze` - type resolution context and global-phase input discovery
//! - `schema` - fields, attributes and expression files a profile can use
//! - `query_profiles` - query profile types declaring query feature types
//! - `models` - machine-learned models imported as ranking expressions
//! - `profile` - rank profiles, inheritance, registry and the compile pipeline
//! - `transform` - expression transforms applied while compiling
//! - `resources` - deduplicated distributable resources (expressions, constants, models)
//! - `derive` - flattening compiled profiles into rank properties
//! - `loader` - building an application from a JSON description
//! - `diagnostics` - warnings and rendered parse errors
//! - `config` - compiler settings

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analyze;
pub mod config;
pub mod derive;
pub mod diagnostics;
pub mod expr;
pub mod loader;
pub mod models;
pub mod profile;
pub mod query_profiles;
pub mod reference;
pub mod resources;
pub mod schema;
pub mod transform;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod loader_tests;
#[cfg(test)]
mod query_profiles_tests;
#[cfg(test)]
mod schema_tests;

use std::path::PathBuf;

pub use config::CompilerConfig;
pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use expr::{Expr, ParseError};
pub use loader::Application;
pub use profile::{CompiledRankProfile, Owner, ProfileId, RankProfile, RankProfileRegistry};
pub use reference::Reference;
pub use rankdef_core::{TensorType, TensorTypeError};

/// Errors raised while building or compiling rank profiles.
///
/// Every variant is a build-time failure of the profile (or application)
/// being processed; there is no partial success.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    TensorType(#[from] TensorTypeError),

    /// Invalid feature arity, malformed special form, or a type mismatch.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invocation loop: {}", .0.join(" -> "))]
    InvocationLoop(Vec<String>),

    #[error("no ONNX model configuration for '{0}'")]
    UnknownOnnxModel(String),

    #[error("no imported model for '{0}'")]
    UnknownModel(String),

    #[error("{context} must produce a double, but produces {actual}")]
    NotScalar { context: String, actual: TensorType },

    #[error("schema '{0}' is already registered")]
    DuplicateSchema(String),

    #[error("schema '{0}' is not registered")]
    UnknownSchema(String),

    #[error("duplicate rank profile '{name}' in {owner}")]
    DuplicateRankProfile { owner: Owner, name: String },

    #[error("rank profile '{profile}' inherits '{inherited}', but this is not found in {owner}")]
    InheritedNotFound {
        profile: String,
        inherited: String,
        owner: Owner,
    },

    #[error("there is a cycle in the inheritance for rank profile '{profile}' = [{}]", .chain.join(", "))]
    InheritanceCycle { profile: String, chain: Vec<String> },

    #[error("only one of the profiles inherited by '{profile}' can contain {property}, but it is present in {}", .parents.join(", "))]
    InheritanceConflict {
        profile: String,
        property: String,
        parents: Vec<String>,
    },

    #[error("'{profile}' inherits '{parent}' which contains {kind} '{name}', but this {kind} is already defined differently in another profile it inherits")]
    InheritedDefinitionConflict {
        profile: String,
        parent: String,
        kind: &'static str,
        name: String,
    },

    #[error("'{profile}' can only inherit the {what} of a directly inherited profile, and '{parent}' is not one")]
    NotDirectlyInherited {
        profile: String,
        parent: String,
        what: &'static str,
    },

    #[error("{kind} '{name}' is already defined in rank profile '{profile}'")]
    DuplicateDefinition {
        profile: String,
        kind: &'static str,
        name: String,
    },

    #[error("cannot have both a constant and a function named '{0}'")]
    NameCollision(String),

    #[error("constant '{name}' has type {tensor_type}, but dense tensor dimensions must have a size")]
    UnboundConstant { name: String, tensor_type: TensorType },

    #[error("query profile type '{profile_type}' contains {feature} with type {declared}, but this is already defined in another query profile with type {existing}")]
    QueryFeatureTypeConflict {
        profile_type: String,
        feature: String,
        declared: TensorType,
        existing: TensorType,
    },

    #[error("invalid input in global-phase expression: {0}")]
    InvalidGlobalPhaseInput(String),

    #[error("{kind} '{name}' defined twice: previous blob has {previous} bytes, while current has {current} bytes")]
    ResourceConflict {
        kind: &'static str,
        name: String,
        previous: usize,
        current: usize,
    },

    #[error("invalid {kind} '{name}': {reason}")]
    InvalidResource {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("illegal expression file name '{0}': must name a file directly inside the schema directory")]
    IllegalPath(String),

    #[error("could not read '{}': {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid application description: {0}")]
    Description(String),

    #[error("rank profile '{profile}' is invalid: {source}")]
    ProfileInvalid {
        profile: String,
        source: Box<Error>,
    },
}

impl Error {
    /// The innermost error, unwrapping `ProfileInvalid` layers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::ProfileInvalid { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;
