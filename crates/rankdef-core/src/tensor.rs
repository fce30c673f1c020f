//! Structural tensor types.
//!
//! A `TensorType` is a cell type plus a set of named dimensions, kept sorted
//! by name so that equality is structural. Rank 0 is the scalar type, which
//! always has `double` cells and prints as `tensor()`.
//!
//! The type algebra mirrors what ranking expressions need at compile time:
//! - `join` for arithmetic between two operands
//! - `dimensionwise_generalization_with` for merging two declarations of the
//!   same feature (query profiles, `if` branches)
//! - `without_dimensions` for reductions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced while building or combining tensor types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TensorTypeError {
    #[error("invalid tensor type spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    #[error("dimension '{0}' is declared more than once")]
    DuplicateDimension(String),

    #[error("cannot join {left} and {right}: dimension '{dimension}' is mapped in one and indexed in the other")]
    IncompatibleDimension {
        left: String,
        right: String,
        dimension: String,
    },

    #[error("{tensor} does not contain dimension '{dimension}'")]
    MissingDimension { tensor: String, dimension: String },
}

/// Cell value type, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CellType {
    Int8,
    BFloat16,
    Float,
    #[default]
    Double,
}

impl CellType {
    pub fn name(self) -> &'static str {
        match self {
            CellType::Int8 => "int8",
            CellType::BFloat16 => "bfloat16",
            CellType::Float => "float",
            CellType::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int8" => Some(CellType::Int8),
            "bfloat16" => Some(CellType::BFloat16),
            "float" => Some(CellType::Float),
            "double" => Some(CellType::Double),
            _ => None,
        }
    }

    /// The cell type able to represent values of both.
    pub fn largest_of(a: CellType, b: CellType) -> CellType {
        a.max(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    Mapped,
    /// Indexed dimension; `None` means unbound (`x[]`).
    Indexed(Option<u64>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
}

impl Dimension {
    pub fn mapped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Mapped,
        }
    }

    pub fn indexed(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Indexed(Some(size)),
        }
    }

    pub fn indexed_unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Indexed(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    pub fn is_mapped(&self) -> bool {
        self.kind == DimensionKind::Mapped
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.kind, DimensionKind::Indexed(_))
    }

    /// Size of a bound indexed dimension.
    pub fn size(&self) -> Option<u64> {
        match self.kind {
            DimensionKind::Indexed(size) => size,
            DimensionKind::Mapped => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DimensionKind::Mapped => write!(f, "{}{{}}", self.name),
            DimensionKind::Indexed(Some(size)) => write!(f, "{}[{}]", self.name, size),
            DimensionKind::Indexed(None) => write!(f, "{}[]", self.name),
        }
    }
}

/// Structural type of a ranking feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    cell_type: CellType,
    /// Sorted by name, names unique.
    dimensions: Vec<Dimension>,
}

impl Default for TensorType {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl TensorType {
    /// The scalar type.
    pub const EMPTY: TensorType = TensorType {
        cell_type: CellType::Double,
        dimensions: Vec::new(),
    };

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn new(
        cell_type: CellType,
        dimensions: impl IntoIterator<Item = Dimension>,
    ) -> Result<Self, TensorTypeError> {
        let mut dimensions: Vec<Dimension> = dimensions.into_iter().collect();
        dimensions.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = dimensions.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(TensorTypeError::DuplicateDimension(pair[0].name.clone()));
        }
        Ok(Self::from_sorted(cell_type, dimensions))
    }

    /// Single mapped dimension with double cells: `tensor(name{})`.
    pub fn mapped(name: impl Into<String>) -> Self {
        Self::from_sorted(CellType::Double, vec![Dimension::mapped(name)])
    }

    fn from_sorted(cell_type: CellType, dimensions: Vec<Dimension>) -> Self {
        let cell_type = if dimensions.is_empty() {
            CellType::Double
        } else {
            cell_type
        };
        Self {
            cell_type,
            dimensions,
        }
    }

    pub fn parse(spec: &str) -> Result<Self, TensorTypeError> {
        SpecParser::new(spec).parse()
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// True if any indexed dimension lacks a size (`x[]`).
    pub fn has_unbound_indexed(&self) -> bool {
        self.dimensions
            .iter()
            .any(|d| d.kind == DimensionKind::Indexed(None))
    }

    /// Type of a binary operation between values of the two types.
    ///
    /// Dimensions present in both must agree on mapped vs. indexed. Two bound
    /// sizes that differ join to the smaller one, a bound size joined with an
    /// unbound one is unbound.
    pub fn join(&self, other: &TensorType) -> Result<TensorType, TensorTypeError> {
        if self.is_scalar() {
            return Ok(other.clone());
        }
        if other.is_scalar() {
            return Ok(self.clone());
        }

        let mut dimensions = self.dimensions.clone();
        for theirs in &other.dimensions {
            let Some(ours) = dimensions.iter_mut().find(|d| d.name == theirs.name) else {
                dimensions.push(theirs.clone());
                continue;
            };
            ours.kind = match (ours.kind, theirs.kind) {
                (DimensionKind::Mapped, DimensionKind::Mapped) => DimensionKind::Mapped,
                (DimensionKind::Indexed(Some(a)), DimensionKind::Indexed(Some(b))) => {
                    DimensionKind::Indexed(Some(a.min(b)))
                }
                (DimensionKind::Indexed(_), DimensionKind::Indexed(_)) => {
                    DimensionKind::Indexed(None)
                }
                _ => {
                    return Err(TensorTypeError::IncompatibleDimension {
                        left: self.to_string(),
                        right: other.to_string(),
                        dimension: theirs.name.clone(),
                    });
                }
            };
        }

        dimensions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self::from_sorted(
            CellType::largest_of(self.cell_type, other.cell_type),
            dimensions,
        ))
    }

    /// The most specific type both `self` and `other` can be assigned to,
    /// if the two have the same dimension names and kinds.
    ///
    /// Bound sizes that differ generalize to unbound.
    pub fn dimensionwise_generalization_with(&self, other: &TensorType) -> Option<TensorType> {
        if self == other {
            return Some(self.clone());
        }
        if self.dimensions.len() != other.dimensions.len() {
            return None;
        }

        let mut dimensions = Vec::with_capacity(self.dimensions.len());
        for (ours, theirs) in self.dimensions.iter().zip(&other.dimensions) {
            if ours.name != theirs.name {
                return None;
            }
            let kind = match (ours.kind, theirs.kind) {
                (DimensionKind::Mapped, DimensionKind::Mapped) => DimensionKind::Mapped,
                (DimensionKind::Indexed(a), DimensionKind::Indexed(b)) if a == b => {
                    DimensionKind::Indexed(a)
                }
                (DimensionKind::Indexed(_), DimensionKind::Indexed(_)) => {
                    DimensionKind::Indexed(None)
                }
                _ => return None,
            };
            dimensions.push(Dimension {
                name: ours.name.clone(),
                kind,
            });
        }

        Some(Self::from_sorted(
            CellType::largest_of(self.cell_type, other.cell_type),
            dimensions,
        ))
    }

    /// This type with the named dimensions removed. An empty list removes all.
    pub fn without_dimensions<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<TensorType, TensorTypeError> {
        if names.is_empty() {
            return Ok(Self::EMPTY);
        }
        for name in names {
            if self.dimension(name.as_ref()).is_none() {
                return Err(TensorTypeError::MissingDimension {
                    tensor: self.to_string(),
                    dimension: name.as_ref().to_owned(),
                });
            }
        }
        let dimensions = self
            .dimensions
            .iter()
            .filter(|d| !names.iter().any(|n| n.as_ref() == d.name))
            .cloned()
            .collect();
        Ok(Self::from_sorted(self.cell_type, dimensions))
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tensor")?;
        if self.cell_type != CellType::Double {
            write!(f, "<{}>", self.cell_type.name())?;
        }
        f.write_str("(")?;
        for (i, dim) in self.dimensions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{dim}")?;
        }
        f.write_str(")")
    }
}

impl FromStr for TensorType {
    type Err = TensorTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TensorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TensorType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let spec = String::deserialize(deserializer)?;
        TensorType::parse(&spec).map_err(serde::de::Error::custom)
    }
}

/// Hand-written scanner for `tensor<cell>(dim, ...)` specs.
struct SpecParser<'s> {
    spec: &'s str,
    rest: &'s str,
}

impl<'s> SpecParser<'s> {
    fn new(spec: &'s str) -> Self {
        Self {
            spec,
            rest: spec.trim(),
        }
    }

    fn parse(mut self) -> Result<TensorType, TensorTypeError> {
        if !self.eat("tensor") {
            return Err(self.error("expected 'tensor'"));
        }

        let mut cell_type = CellType::Double;
        if self.eat("<") {
            let name = self.take_while(|c| c.is_ascii_alphanumeric());
            cell_type = CellType::from_name(name)
                .ok_or_else(|| self.error(&format!("unknown cell type '{name}'")))?;
            if !self.eat(">") {
                return Err(self.error("expected '>'"));
            }
        }

        if !self.eat("(") {
            return Err(self.error("expected '('"));
        }

        let mut dimensions = Vec::new();
        if !self.eat(")") {
            loop {
                dimensions.push(self.dimension()?);
                if self.eat(")") {
                    break;
                }
                if !self.eat(",") {
                    return Err(self.error("expected ',' or ')'"));
                }
            }
        }

        if !self.rest.trim().is_empty() {
            return Err(self.error("trailing characters"));
        }

        TensorType::new(cell_type, dimensions)
    }

    fn dimension(&mut self) -> Result<Dimension, TensorTypeError> {
        self.skip_whitespace();
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if name.is_empty() {
            return Err(self.error("expected dimension name"));
        }
        let name = name.to_owned();

        if self.eat("{") {
            if !self.eat("}") {
                return Err(self.error("expected '}'"));
            }
            return Ok(Dimension::mapped(name));
        }

        if self.eat("[") {
            self.skip_whitespace();
            let digits = self.take_while(|c| c.is_ascii_digit());
            let size = if digits.is_empty() {
                None
            } else {
                Some(
                    digits
                        .parse::<u64>()
                        .map_err(|_| self.error("dimension size out of range"))?,
                )
            };
            if !self.eat("]") {
                return Err(self.error("expected ']'"));
            }
            return Ok(Dimension {
                name,
                kind: DimensionKind::Indexed(size),
            });
        }

        Err(self.error(&format!("expected '{{}}' or '[]' after dimension '{name}'")))
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest.len(), |(i, _)| i);
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn error(&self, reason: &str) -> TensorTypeError {
        TensorTypeError::InvalidSpec {
            spec: self.spec.to_owned(),
            reason: reason.to_owned(),
        }
    }
}
