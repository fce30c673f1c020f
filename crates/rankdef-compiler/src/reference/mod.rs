//! Canonical rank feature references.
//!
//! A [`Reference`] names a rank feature: `name`, `name(args)`,
//! `name(args).output` or `name.output`. References are immutable values
//! compared structurally and used as map keys throughout the compiler.

pub mod feature_names;


use std::fmt;

use crate::expr::{Expr, Literal};
use crate::{Error, Result};

pub use feature_names::FeatureList;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    name: String,
    arguments: Vec<Expr>,
    output: Option<String>,
}

impl Reference {
    pub fn new(name: impl Into<String>, arguments: Vec<Expr>, output: Option<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
            output,
        }
    }

    /// A bare name without arguments or output.
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), None)
    }

    /// `name(argument)` with the argument in canonical form: a plain
    /// identifier when it needs no quoting, a string literal otherwise.
    pub fn simple(name: impl Into<String>, argument: &str) -> Self {
        let argument = if feature_names::needs_quoting(argument) {
            Expr::Literal(Literal::String(argument.to_owned()))
        } else {
            Expr::Reference(Reference::identifier(argument))
        };
        Self::new(name, vec![argument], None)
    }

    /// Parse a single feature reference, e.g. `attribute(title).count`.
    pub fn parse(text: &str) -> Result<Self> {
        match Expr::parse(text)? {
            Expr::Reference(reference) => Ok(reference),
            other => Err(Error::invalid(format!(
                "'{text}' is not a feature reference, but a {}",
                other.describe()
            ))),
        }
    }

    pub fn with_output(mut self, output: Option<String>) -> Self {
        self.output = output;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Expr] {
        &self.arguments
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn is_identifier(&self) -> bool {
        self.arguments.is_empty() && self.output.is_none()
    }

    /// The single argument as plain text, if it is an identifier or a string.
    /// The output, if any, is ignored.
    pub fn simple_argument(&self) -> Option<&str> {
        let [argument] = self.arguments.as_slice() else {
            return None;
        };
        match argument {
            Expr::Reference(r) if r.is_identifier() => Some(r.name()),
            Expr::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    /// `name(argument)` with no output.
    pub fn is_simple(&self) -> bool {
        self.output.is_none() && self.simple_argument().is_some()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.arguments.is_empty() {
            f.write_str("(")?;
            for (i, argument) in self.arguments.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{argument}")?;
            }
            f.write_str(")")?;
        }
        if let Some(output) = &self.output {
            write!(f, ".{output}")?;
        }
        Ok(())
    }
}
