//! Rank profiles: declarations, inheritance, the registry and compilation.
//!
//! A [`RankProfile`] records what was declared. Profiles live in a
//! [`RankProfileRegistry`] and are read through [`ProfileRef`], which applies
//! inheritance. [`ProfileRef::compile`] produces an immutable
//! [`CompiledRankProfile`].

mod compile;
mod compiled;
mod constant;
mod function;
mod inheritance;
mod input;
mod onnx;
mod rank_profile;
mod registry;
mod tuning;

#[cfg(test)]
mod compile_tests;
#[cfg(test)]
mod rank_profile_tests;
#[cfg(test)]
mod registry_tests;

pub use compile::{CompileContext, compile_all};
pub use compiled::CompiledRankProfile;
pub use constant::{Constant, ConstantValue};
pub use function::RankingExpressionFunction;
pub use inheritance::ProfileRef;
pub use input::Input;
pub use onnx::{ExecutionHints, OnnxModel};
pub use rank_profile::{FIRST_PHASE, GLOBAL_PHASE, OVERRIDABLE_NAMES, RankProfile, SECOND_PHASE};
pub use registry::{Owner, ProfileId, RankProfileRegistry};
pub use tuning::{
    MatchPhaseSettings, RankProperty, RankSetting, RankSettingKey, RankSettingKind, Tuning,
};
