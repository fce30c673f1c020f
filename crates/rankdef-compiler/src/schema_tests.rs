use rankdef_core::TensorType;

use crate::Error;
use crate::reference::Reference;
use crate::schema::{Attribute, Field, ImportedField, Schema};

fn tensor(text: &str) -> TensorType {
    TensorType::parse(text).unwrap()
}

fn attribute(name: &str) -> Reference {
    Reference::simple("attribute", name)
}

#[test]
fn attribute_types_cover_fields_and_imports() {
    let schema = Schema::new("music")
        .with_field(Field::new("popularity", TensorType::empty()).with_attribute())
        .with_field(Field::new("title", TensorType::empty()).indexed())
        .with_field(Field::new("embedding", tensor("tensor<float>(x[4])")).with_named_attribute("emb"))
        .with_imported_field(ImportedField::new(
            "artist_rank",
            "artist_ref",
            Attribute::new("rank", tensor("tensor(r{})")),
        ));

    let types = schema.attribute_types();
    let keys: Vec<String> = types.keys().map(Reference::to_string).collect();
    assert_eq!(
        keys,
        [
            "attribute(popularity)",
            "attribute(emb)",
            "attribute(embedding)",
            "attribute(artist_rank)",
        ]
    );
    assert_eq!(types[&attribute("embedding")].to_string(), "tensor<float>(x[4])");
    assert_eq!(types[&attribute("artist_rank")].to_string(), "tensor(r{})");
    assert!(!types.contains_key(&attribute("title")));
}

#[test]
fn expression_sources_are_read_with_or_without_suffix() {
    let mut schema = Schema::new("music");
    schema.add_expression_source("big", "attribute(a) * 2");

    assert_eq!(schema.read_expression_file("big").unwrap(), "attribute(a) * 2");
    assert_eq!(
        schema.read_expression_file("big.expression").unwrap(),
        "attribute(a) * 2"
    );
}

#[test]
fn expression_files_are_read_from_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("score.expression"), "bm25(title)").unwrap();
    let schema = Schema::new("music").with_expression_dir(dir.path());

    assert_eq!(schema.read_expression_file("score").unwrap(), "bm25(title)");
    assert!(matches!(
        schema.read_expression_file("missing"),
        Err(Error::Io { .. })
    ));
}

#[test]
fn paths_outside_the_directory_are_illegal() {
    let schema = Schema::new("music");
    for name in ["", "../secret", "sub/file", "a\\b", "/etc/passwd"] {
        let err = schema.read_expression_file(name).unwrap_err();
        assert!(matches!(err, Error::IllegalPath(_)), "{name}");
    }
}
