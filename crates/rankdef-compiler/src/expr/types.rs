//! Type rules for ranking expressions.
//!
//! Leaves are typed by a [`TypeResolver`]; every other node derives its
//! type from its children.

use rankdef_core::TensorType;

use super::ast::Expr;
use crate::reference::Reference;
use crate::{Error, Result};

/// Source of types for feature references.
pub trait TypeResolver {
    fn resolve(&self, reference: &Reference) -> Result<TensorType>;
}

impl Expr {
    /// Structural type this expression produces.
    pub fn type_of(&self, resolver: &dyn TypeResolver) -> Result<TensorType> {
        match self {
            Expr::Literal(_) => Ok(TensorType::empty()),
            Expr::Reference(reference) => resolver.resolve(reference),
            Expr::Embraced(inner) => inner.type_of(resolver),
            Expr::Unary { operand, .. } => operand.type_of(resolver),
            Expr::Binary { lhs, rhs, .. } => {
                Ok(lhs.type_of(resolver)?.join(&rhs.type_of(resolver)?)?)
            }
            Expr::If {
                condition,
                then,
                otherwise,
            } => {
                condition.type_of(resolver)?;
                let then_type = then.type_of(resolver)?;
                let otherwise_type = otherwise.type_of(resolver)?;
                then_type
                    .dimensionwise_generalization_with(&otherwise_type)
                    .ok_or_else(|| {
                        Error::invalid(format!(
                            "an if expression must produce compatible types in both alternatives, \
                             but the 'true' type is {then_type} while the 'false' type is {otherwise_type}"
                        ))
                    })
            }
            Expr::Call { arguments, .. } => {
                let mut result = TensorType::empty();
                for argument in arguments {
                    result = result.join(&argument.type_of(resolver)?)?;
                }
                Ok(result)
            }
            Expr::Reduce {
                argument,
                dimensions,
                ..
            } => Ok(argument.type_of(resolver)?.without_dimensions(dimensions)?),
            Expr::Map { argument, .. } => argument.type_of(resolver),
            Expr::Join { lhs, rhs, .. } => {
                Ok(lhs.type_of(resolver)?.join(&rhs.type_of(resolver)?)?)
            }
        }
    }
}
