use crate::Error;
use crate::profile::{Owner, RankProfile, RankProfileRegistry};
use crate::schema::Schema;

fn registry_with(schemas: &[Schema]) -> RankProfileRegistry {
    let mut registry = RankProfileRegistry::new();
    for schema in schemas {
        registry.add_schema(schema.clone()).unwrap();
    }
    registry
}

fn music() -> Owner {
    Owner::schema("music")
}

#[test]
fn schema_gets_builtin_profiles() {
    let registry = registry_with(&[Schema::new("music")]);

    let owner = music();
    let names: Vec<&str> = registry.profiles_of(&owner).map(|p| p.name()).collect();
    assert_eq!(names, ["default", "unranked"]);
    let unranked = registry.get(&music(), "unranked").unwrap();
    assert!(unranked.raw().is_builtin());
    assert_eq!(unranked.raw().tuning.rerank_count, Some(0));
}

#[test]
fn duplicate_schema_is_rejected() {
    let mut registry = registry_with(&[Schema::new("music")]);
    let err = registry.add_schema(Schema::new("music")).unwrap_err();
    assert!(matches!(err, Error::DuplicateSchema(name) if name == "music"));
}

#[test]
fn profile_for_unknown_schema_is_rejected() {
    let mut registry = RankProfileRegistry::new();
    let err = registry
        .add(RankProfile::new("p", Owner::schema("books")))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownSchema(name) if name == "books"));
}

#[test]
fn duplicate_profile_is_rejected() {
    let mut registry = registry_with(&[Schema::new("music")]);
    registry.add(RankProfile::new("p", music())).unwrap();
    let err = registry.add(RankProfile::new("p", music())).unwrap_err();

    assert_eq!(err.to_string(), "duplicate rank profile 'p' in schema 'music'");
}

#[test]
fn same_name_in_different_owners_is_allowed() {
    let mut registry = registry_with(&[Schema::new("music"), Schema::new("books")]);
    registry.add(RankProfile::new("p", music())).unwrap();
    registry.add(RankProfile::new("p", Owner::schema("books"))).unwrap();
    registry.add(RankProfile::new("p", Owner::Global)).unwrap();

    assert_eq!(registry.len(), 7);
}

#[test]
fn builtin_default_is_replaced_in_place() {
    let mut registry = registry_with(&[Schema::new("music")]);
    let before = registry.get(&music(), "default").unwrap().id();
    let mut replacement = RankProfile::new("default", music());
    replacement.set_first_phase("attribute(popularity)").unwrap();

    let id = registry.add(replacement).unwrap();

    assert_eq!(id, before);
    let default = registry.profile(id);
    assert!(!default.raw().is_builtin());
    assert!(default.raw().first_phase.is_some());
}

#[test]
fn user_default_declared_twice_keeps_the_last() {
    let mut registry = registry_with(&[Schema::new("music")]);
    let mut first = RankProfile::new("default", music());
    first.set_first_phase("1").unwrap();
    let mut second = RankProfile::new("default", music());
    second.set_first_phase("2").unwrap();

    registry.add(first).unwrap();
    registry.add(second).unwrap();

    let default = registry.get(&music(), "default").unwrap();
    let phase = default.first_phase().unwrap().unwrap();
    assert_eq!(phase.to_string(), "2");
}

#[test]
fn resolve_searches_schema_then_parents_then_global() {
    let mut registry = registry_with(&[
        Schema::new("base"),
        Schema::new("music").inheriting("base"),
    ]);
    let in_base = registry.add(RankProfile::new("shared", Owner::schema("base"))).unwrap();
    let global = registry.add(RankProfile::new("everywhere", Owner::Global)).unwrap();
    let local = registry.add(RankProfile::new("shared", music())).unwrap();

    assert_eq!(registry.resolve(&music(), "shared"), Some(local));
    assert_eq!(registry.resolve(&music(), "everywhere"), Some(global));
    assert_eq!(registry.resolve_in_parent_schemas("music", "shared"), Some(in_base));
    assert_eq!(registry.resolve(&Owner::Global, "shared"), None);
}

#[test]
fn resolve_tolerates_schema_inheritance_loops() {
    let registry = registry_with(&[
        Schema::new("a").inheriting("b"),
        Schema::new("b").inheriting("a"),
    ]);
    assert_eq!(registry.resolve(&Owner::schema("a"), "missing"), None);
}
