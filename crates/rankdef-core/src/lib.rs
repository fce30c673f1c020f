#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the rankdef crates.
//!
//! Two layers:
//! - **Tensor types** (`TensorType`): the structural type of every ranking
//!   feature, with named mapped/indexed dimensions and a cell type
//! - **Names** (`utils`): identifier checks shared by the expression lexer
//!   and the feature-name model

pub mod tensor;
pub mod utils;


pub use tensor::{CellType, Dimension, DimensionKind, TensorType, TensorTypeError};
