use indoc::indoc;

use crate::CompilerConfig;
use crate::reference::Reference;
use crate::test_utils::{application, application_with, compile_error, compiled};

fn names<'a>(features: impl IntoIterator<Item = &'a Reference>) -> Vec<String> {
    features.into_iter().map(Reference::to_string).collect()
}

#[test]
fn inline_function_is_substituted_into_phase() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "functions": [{ "name": "f", "expression": "attribute(a) * 2", "inline": true }],
            "first-phase": "f + 1"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    assert_eq!(profile.first_phase().unwrap().to_string(), "(attribute(a) * 2) + 1");
    assert!(profile.functions().contains_key("f"));
}

#[test]
fn nested_inline_functions_are_substituted_recursively() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "functions": [
              { "name": "inner", "expression": "attribute(a)", "inline": true },
              { "name": "outer", "expression": "inner * inner", "inline": true },
              { "name": "uses", "expression": "outer + 1" }
            ],
            "first-phase": "uses"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    assert_eq!(
        profile.functions()["uses"].body().to_string(),
        "(attribute(a) * attribute(a)) + 1"
    );
    assert_eq!(profile.first_phase().unwrap().to_string(), "uses");
}

#[test]
fn inherited_functions_with_different_bodies_fail_naming_the_function() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [
            { "name": "a", "functions": [{ "name": "score", "expression": "attribute(x)" }] },
            { "name": "b", "functions": [{ "name": "score", "expression": "attribute(y)" }] },
            { "name": "child", "inherits": ["a", "b"], "first-phase": "score" }
          ]
        }
    "#});
    let message = compile_error(&app, None, "child");

    assert_eq!(
        message,
        "rank profile 'child' is invalid: 'child' inherits 'b' which contains function 'score', \
         but this function is already defined differently in another profile it inherits"
    );
}

#[test]
fn function_and_constant_may_not_share_a_name() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "functions": [{ "name": "score", "expression": "1" }],
            "constants": [{ "name": "score", "type": "tensor()", "value": "2" }]
          }]
        }
    "#});
    assert_eq!(
        compile_error(&app, None, "p"),
        "rank profile 'p' is invalid: cannot have both a constant and a function named 'score'"
    );
}

#[test]
fn self_referencing_function_is_an_invocation_loop() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "functions": [{ "name": "f", "expression": "f" }],
            "first-phase": "f"
          }]
        }
    "#});
    assert_eq!(
        compile_error(&app, None, "p"),
        "rank profile 'p' is invalid: invocation loop: f -> f"
    );
}

#[test]
fn self_referencing_inline_function_is_an_invocation_loop() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "functions": [{ "name": "f", "expression": "f + 1", "inline": true }],
            "first-phase": "f"
          }]
        }
    "#});
    assert_eq!(
        compile_error(&app, None, "p"),
        "rank profile 'p' is invalid: invocation loop: f -> f"
    );
}

#[test]
fn phase_must_be_scalar() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "inputs": [{ "name": "q", "type": "tensor(x[3])" }],
            "first-phase": "query(q)"
          }]
        }
    "#});
    assert_eq!(
        compile_error(&app, None, "p"),
        "rank profile 'p' is invalid: first-phase expression must produce a double, \
         but produces tensor(x[3])"
    );
}

const UNDECLARED_QUERY: &str = indoc! {r#"
    {
      "schemas": [{
        "name": "music",
        "fields": [{ "name": "embedding", "type": "tensor(x[3])", "attribute": true }],
        "rank-profiles": [{
          "name": "p",
          "first-phase": "reduce(attribute(embedding), sum) * query(boost)"
        }, {
          "name": "strict",
          "inherits": ["p"],
          "tuning": { "strict": true }
        }]
      }]
    }
"#};

#[test]
fn undeclared_query_feature_is_scalar_with_a_warning() {
    let app = application(UNDECLARED_QUERY);
    let profile = compiled(&app, Some("music"), "p");

    assert_eq!(names(profile.query_features_not_declared()), ["query(boost)"]);
    let diagnostics = profile.diagnostics();
    assert_eq!(diagnostics.warning_count(), 1);
    assert!(!diagnostics.has_errors());
    assert_eq!(
        diagnostics.iter().next().unwrap().message(),
        "query(boost) is not declared in a query profile type or as an input, \
         and will be interpreted as a scalar"
    );
}

#[test]
fn undeclared_query_feature_warning_can_be_disabled() {
    let config = CompilerConfig::default().with_warn_undeclared_query_features(false);
    let app = application_with(UNDECLARED_QUERY, config);
    let profile = compiled(&app, Some("music"), "p");

    assert!(profile.diagnostics().is_empty());
    assert_eq!(profile.query_features_not_declared().len(), 1);
}

#[test]
fn strict_profile_rejects_undeclared_query_feature() {
    let app = application(UNDECLARED_QUERY);
    assert_eq!(
        compile_error(&app, Some("music"), "strict"),
        "rank profile 'strict' is invalid: query(boost) is not declared in a query profile type \
         or as an input, which is required in strict mode"
    );
}

#[test]
fn query_profile_type_declares_query_features() {
    let app = application(indoc! {r#"
        {
          "query-profile-types": [{
            "id": "root",
            "fields": {
              "ranking.features.query(v)": "tensor(x[3])",
              "input.w": "tensor(x[3])"
            }
          }],
          "rank-profiles": [{
            "name": "p",
            "first-phase": "reduce(query(v) * query(w), sum)"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    assert!(profile.query_features_not_declared().is_empty());
    let declared = &profile.feature_types()[&Reference::simple("query", "w")];
    assert_eq!(declared.to_string(), "tensor(x[3])");
}

#[test]
fn global_phase_inputs_become_match_features() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "functions": [{ "name": "quality", "expression": "attribute(rating) * 0.5" }],
            "first-phase": "nativeRank",
            "global-phase": "quality + attribute(popularity) + query(q)",
            "match-features": "bm25(title)"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    assert_eq!(
        names(profile.match_features()),
        ["bm25(title)", "attribute(rating)", "attribute(popularity)"]
    );
}

#[test]
fn tensor_max_over_a_dimension_becomes_a_reduce() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "inputs": [
              { "name": "query(v)", "type": "tensor(x[3])" },
              { "name": "query(s)", "type": "tensor()" }
            ],
            "first-phase": "max(query(v), x) + max(query(s), 2)"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    assert_eq!(
        profile.first_phase().unwrap().to_string(),
        "reduce(query(v), max, x) + max(query(s), 2)"
    );
}

#[test]
fn inline_constants_are_exported_as_rank_properties() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "constants": [{ "name": "w", "type": "tensor(x[2])", "value": "[1, 2]" }],
            "first-phase": "reduce(constant(w), sum)"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    let properties: Vec<(&str, &str)> = profile
        .rank_properties()
        .iter()
        .map(|p| (p.name.as_str(), p.value.as_str()))
        .collect();
    assert_eq!(
        properties,
        [
            ("constant(w).value", "[1, 2]"),
            ("constant(w).type", "tensor(x[2])"),
        ]
    );
}

#[test]
fn emitted_rank_properties_are_appended_after_declared_ones() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "constants": [{ "name": "w", "type": "tensor(x[2])", "value": "[1, 2]" }],
            "first-phase": "reduce(constant(w), sum)",
            "rank-properties": [
              { "name": "constant(w).type", "value": "user" },
              { "name": "constant(w).value", "value": "[1, 2]" }
            ]
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    let properties: Vec<(&str, &str)> = profile
        .rank_properties()
        .iter()
        .map(|p| (p.name.as_str(), p.value.as_str()))
        .collect();
    assert_eq!(
        properties,
        [
            ("constant(w).type", "user"),
            ("constant(w).value", "[1, 2]"),
            ("constant(w).type", "tensor(x[2])"),
        ]
    );
}

#[test]
fn imported_model_expression_and_functions_are_added() {
    let app = application(indoc! {r#"
        {
          "models": [{
            "name": "ranker",
            "kind": "lightgbm",
            "expression": "helper * 2",
            "functions": [{ "name": "helper", "expression": "attribute(a) + 1" }]
          }],
          "rank-profiles": [{
            "name": "p",
            "first-phase": "lightgbm(\"models/ranker.json\") + 1"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    assert_eq!(profile.first_phase().unwrap().to_string(), "(helper * 2) + 1");
    assert_eq!(profile.functions()["helper"].body().to_string(), "attribute(a) + 1");
    assert_eq!(profile.function_types()["helper"].to_string(), "tensor()");
}

#[test]
fn unknown_model_is_an_error() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{ "name": "p", "first-phase": "xgboost(\"models/missing.json\")" }]
        }
    "#});
    assert_eq!(
        compile_error(&app, None, "p"),
        "rank profile 'p' is invalid: no imported model for 'xgboost(\"models/missing.json\")'"
    );
}

#[test]
fn onnx_reference_gets_its_default_output() {
    let app = application(indoc! {r#"
        {
          "rank-profiles": [{
            "name": "p",
            "onnx-models": [{
              "name": "m",
              "file": "models/m.onnx",
              "outputs": { "logits": "score" },
              "output-types": { "score": "tensor<float>(d0[1])" }
            }],
            "first-phase": "reduce(onnx(m), sum)"
          }]
        }
    "#});
    let profile = compiled(&app, None, "p");

    assert_eq!(
        profile.first_phase().unwrap().to_string(),
        "reduce(onnx(m).score, sum)"
    );
}

#[test]
fn compile_all_covers_builtin_profiles() {
    let app = application(indoc! {r#"
        { "schemas": [{ "name": "music" }] }
    "#});
    let compiled = app.compile_all().unwrap();

    let names: Vec<&str> = compiled.iter().map(|p| p.name()).collect();
    assert_eq!(names, ["default", "unranked"]);
    assert_eq!(compiled[1].first_phase().unwrap().to_string(), "0");
}
