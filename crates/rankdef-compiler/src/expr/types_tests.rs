use std::collections::HashMap;

use rankdef_core::TensorType;

use super::ast::Expr;
use super::types::TypeResolver;
use crate::reference::Reference;
use crate::{Error, Result};

/// Resolves from a fixed map, unknown references are scalars.
struct MapResolver(HashMap<Reference, TensorType>);

impl MapResolver {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(r, t)| (Reference::parse(r).unwrap(), TensorType::parse(t).unwrap()))
                .collect(),
        )
    }
}

impl TypeResolver for MapResolver {
    fn resolve(&self, reference: &Reference) -> Result<TensorType> {
        Ok(self.0.get(reference).cloned().unwrap_or_default())
    }
}

fn type_of(resolver: &MapResolver, text: &str) -> Result<String> {
    Expr::parse(text)?.type_of(resolver).map(|t| t.to_string())
}

#[test]
fn literals_and_unknowns_are_scalar() {
    let resolver = MapResolver::new(&[]);
    assert_eq!(type_of(&resolver, "1 + 2").unwrap(), "tensor()");
    assert_eq!(type_of(&resolver, "bm25(title) * 2").unwrap(), "tensor()");
}

#[test]
fn arithmetic_joins() {
    let resolver = MapResolver::new(&[
        ("query(q)", "tensor<float>(x[3])"),
        ("attribute(d)", "tensor<float>(x[3],y{})"),
        ("attribute(m)", "tensor(x{})"),
    ]);
    assert_eq!(
        type_of(&resolver, "query(q) * attribute(d)").unwrap(),
        "tensor<float>(x[3],y{})"
    );
    assert_eq!(type_of(&resolver, "-query(q) + 1").unwrap(), "tensor<float>(x[3])");
    assert_eq!(type_of(&resolver, "sigmoid(query(q))").unwrap(), "tensor<float>(x[3])");

    let err = type_of(&resolver, "query(q) + attribute(m)").unwrap_err();
    assert!(matches!(err, Error::TensorType(_)));
}

#[test]
fn reduce_removes_dimensions() {
    let resolver = MapResolver::new(&[("attribute(d)", "tensor<float>(x[3],y{})")]);
    assert_eq!(
        type_of(&resolver, "reduce(attribute(d), sum, x)").unwrap(),
        "tensor<float>(y{})"
    );
    assert_eq!(type_of(&resolver, "reduce(attribute(d), max)").unwrap(), "tensor()");
    assert!(type_of(&resolver, "reduce(attribute(d), sum, z)").is_err());
}

#[test]
fn if_generalizes_branches() {
    let resolver = MapResolver::new(&[
        ("query(a)", "tensor(x[2])"),
        ("query(b)", "tensor(x[5])"),
        ("query(c)", "tensor(y{})"),
    ]);
    assert_eq!(
        type_of(&resolver, "if (1 > 0, query(a), query(b))").unwrap(),
        "tensor(x[])"
    );
    let err = type_of(&resolver, "if (1 > 0, query(a), query(c))").unwrap_err();
    assert_eq!(
        err.to_string(),
        "an if expression must produce compatible types in both alternatives, \
         but the 'true' type is tensor(x[2]) while the 'false' type is tensor(y{})"
    );
}

#[test]
fn map_keeps_argument_type() {
    let resolver = MapResolver::new(&[("attribute(d)", "tensor<int8>(x[8])")]);
    assert_eq!(
        type_of(&resolver, "map(attribute(d), f(v)(v * 2))").unwrap(),
        "tensor<int8>(x[8])"
    );
}
