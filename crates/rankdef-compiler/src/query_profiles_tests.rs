use rankdef_core::TensorType;

use crate::query_profiles::{QueryProfileRegistry, QueryProfileType};
use crate::reference::Reference;

fn tensor(text: &str) -> TensorType {
    TensorType::parse(text).unwrap()
}

fn query(name: &str) -> Reference {
    Reference::simple("query", name)
}

#[test]
fn only_rank_feature_fields_declare_features() {
    let profile_type = QueryProfileType::new("root")
        .with_field("ranking.features.query(a)", tensor("tensor(x[2])"))
        .with_field("rankfeature.query(b)", tensor("tensor(y{})"))
        .with_field("input.c", tensor("tensor(z[1])"))
        .with_field("hits", TensorType::empty());

    let features: Vec<String> = profile_type
        .feature_types()
        .map(|(feature, _)| feature.to_string())
        .collect();
    assert_eq!(features, ["query(a)", "query(b)", "query(c)"]);
}

#[test]
fn same_feature_in_several_types_is_generalized() {
    let mut registry = QueryProfileRegistry::new();
    registry.add(QueryProfileType::new("a").with_field("input.q", tensor("tensor(x[3])")));
    registry.add(QueryProfileType::new("b").with_field("input.q", tensor("tensor(x[5])")));

    let types = registry.feature_types().unwrap();
    assert_eq!(types[&query("q")].to_string(), "tensor(x[])");
}

#[test]
fn incompatible_declarations_conflict() {
    let mut registry = QueryProfileRegistry::new();
    registry.add(QueryProfileType::new("a").with_field("input.q", tensor("tensor(x[3])")));
    registry.add(QueryProfileType::new("b").with_field("input.q", tensor("tensor(y{})")));

    assert!(registry.feature_types().is_err());
}
