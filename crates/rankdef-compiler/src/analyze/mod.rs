//! Semantic analysis of ranking expressions.
//!
//! - `type_context` - per-profile type resolution of feature references
//! - `inputs` - discovery of the inputs a global-phase expression consumes

pub mod inputs;
pub mod type_context;

#[cfg(test)]
mod inputs_tests;
#[cfg(test)]
mod type_context_tests;

pub use inputs::global_phase_inputs;
pub use type_context::{FunctionTable, TypeContext};
