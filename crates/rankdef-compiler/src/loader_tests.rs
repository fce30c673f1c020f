use indoc::indoc;

use crate::loader::ApplicationDescription;
use crate::profile::ConstantValue;
use crate::resources::DistributableResource;
use crate::test_utils::{application, compiled};
use crate::{Application, CompilerConfig, Error, Owner, Reference};

fn load_error(json: &str) -> Error {
    match Application::from_json(json, CompilerConfig::default()) {
        Ok(_) => panic!("expected the description to be rejected"),
        Err(e) => e,
    }
}

#[test]
fn malformed_description_is_a_description_error() {
    let err = load_error(r#"{ "schemas": [{ "nam": "music" }] }"#);
    assert!(matches!(err, Error::Description(_)));
}

#[test]
fn empty_description_is_valid() {
    let description = ApplicationDescription::from_json("{}").unwrap();
    assert!(description.schemas.is_empty());
    assert!(description.rank_profiles.is_empty());
}

#[test]
fn schema_profiles_and_globals_are_registered() {
    let app = application(indoc! {r#"
        {
          "schemas": [{
            "name": "music",
            "rank-profiles": [{ "name": "p", "inherits": ["shared"] }]
          }],
          "rank-profiles": [{ "name": "shared", "first-phase": "nativeRank" }]
        }
    "#});

    assert_eq!(app.registry().len(), 4);
    let p = app.registry().get(&Owner::schema("music"), "p").unwrap();
    assert_eq!(p.inherited().unwrap()[0].owner(), &Owner::Global);
}

#[test]
fn field_types_map_to_attribute_types() {
    let app = application(indoc! {r#"
        {
          "schemas": [{
            "name": "music",
            "fields": [
              { "name": "year", "type": "int", "attribute": true },
              { "name": "embedding", "type": "tensor<float>(x[8])", "attribute": true },
              { "name": "title", "type": "string", "indexed": true }
            ],
            "rank-profiles": [{ "name": "p" }]
          }]
        }
    "#});
    let profile = compiled(&app, Some("music"), "p");

    let types = profile.feature_types();
    assert_eq!(types[&Reference::simple("attribute", "year")].to_string(), "tensor()");
    assert_eq!(
        types[&Reference::simple("attribute", "embedding")].to_string(),
        "tensor<float>(x[8])"
    );
    assert!(!types.contains_key(&Reference::simple("attribute", "title")));
}

#[test]
fn expressions_can_come_from_schema_files() {
    let app = application(indoc! {r#"
        {
          "schemas": [{
            "name": "music",
            "expressions": { "big": "attribute(a) + attribute(b)" },
            "rank-profiles": [{
              "name": "p",
              "first-phase": "file:big",
              "functions": [{ "name": "f", "expression": "file: big.expression" }]
            }]
          }]
        }
    "#});
    let profile = compiled(&app, Some("music"), "p");

    assert_eq!(
        profile.first_phase().unwrap().to_string(),
        "attribute(a) + attribute(b)"
    );
    assert_eq!(profile.functions()["f"].body().to_string(), "attribute(a) + attribute(b)");
}

#[test]
fn expression_files_are_relative_to_the_description() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("expressions")).unwrap();
    std::fs::write(dir.path().join("expressions/score.expression"), "bm25(title)").unwrap();
    let path = dir.path().join("app.json");
    std::fs::write(
        &path,
        r#"{
          "schemas": [{
            "name": "music",
            "expression-dir": "expressions",
            "rank-profiles": [{ "name": "p", "first-phase": "file:score" }]
          }]
        }"#,
    )
    .unwrap();

    let app = Application::load(&path, CompilerConfig::default()).unwrap();
    let profile = compiled(&app, Some("music"), "p");
    assert_eq!(profile.first_phase().unwrap().to_string(), "bm25(title)");
}

#[test]
fn global_profiles_cannot_use_expression_files() {
    let err = load_error(r#"{ "rank-profiles": [{ "name": "p", "first-phase": "file:x" }] }"#);
    assert_eq!(
        err.to_string(),
        "invalid application description: 'file:x': expression files can only be used in schema rank profiles"
    );
}

#[test]
fn constant_needs_exactly_one_source() {
    let err = load_error(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "constants": [{ "name": "w", "type": "tensor(x{})", "value": "{}", "file": "w.json" }]
          }]
        }
    "#});
    assert_eq!(
        err.to_string(),
        "invalid application description: constant 'w' must have exactly one of value, file and uri"
    );
}

#[test]
fn file_constants_and_onnx_models_are_distributed() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "constants": [
              { "name": "big", "type": "tensor(x{})", "file": "constants/big.json" },
              { "name": "small", "type": "tensor()", "value": "2" }
            ],
            "onnx-models": [{ "name": "m", "file": "models/m.onnx" }]
          }, {
            "name": "q",
            "constants": [{ "name": "big", "type": "tensor(x{})", "file": "constants/big.json" }]
          }]
        }
    "#});

    assert_eq!(app.constants().len(), 1);
    assert_eq!(app.onnx_models().len(), 1);
    assert_eq!(app.file_registry().len(), 2);
    let big = app.constants().get("big").unwrap();
    assert_eq!(big.value(), &ConstantValue::File("constants/big.json".into()));
    assert!(big.file_reference().is_some());
}

#[test]
fn conflicting_file_constants_are_rejected() {
    let err = load_error(indoc! {r#"
        {
          "rank-profiles": [
            { "name": "p", "constants": [{ "name": "c", "type": "tensor(x{})", "file": "a.json" }] },
            { "name": "q", "constants": [{ "name": "c", "type": "tensor(x{})", "file": "bb.json" }] }
          ]
        }
    "#});
    assert_eq!(
        err.to_string(),
        "ranking constant 'c' defined twice: previous blob has 6 bytes, while current has 7 bytes"
    );
}

#[test]
fn unknown_model_kind_is_rejected() {
    let err = load_error(r#"{ "models": [{ "name": "m", "kind": "tf", "expression": "1" }] }"#);
    assert_eq!(
        err.to_string(),
        "invalid application description: model 'm' has unknown kind 'tf'"
    );
}

#[test]
fn inputs_accept_bare_and_feature_names() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "inputs": [
              { "name": "a", "type": "tensor(x[2])" },
              { "name": "query(b)", "type": "tensor()", "default": "0.5" }
            ]
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    let names: Vec<String> = profile.inputs().keys().map(Reference::to_string).collect();
    assert_eq!(names, ["query(a)", "query(b)"]);
}

#[test]
fn tuning_rejects_unknown_knobs() {
    let err = load_error(r#"{ "rank-profiles": [{ "name": "p", "tuning": { "rerank": 1 } }] }"#);
    assert!(matches!(err, Error::Description(_)));
}
