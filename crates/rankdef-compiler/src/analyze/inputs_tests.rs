use indexmap::IndexSet;

use super::inputs::global_phase_inputs;
use super::type_context::FunctionTable;
use crate::expr::{Expr, ExpressionFunction};
use crate::reference::Reference;

fn functions(definitions: &[(&str, &[&str], &str)]) -> FunctionTable {
    definitions
        .iter()
        .map(|(name, arguments, body)| {
            let arguments = arguments.iter().map(|a| a.to_string()).collect();
            let function = ExpressionFunction::new(*name, arguments, Expr::parse(body).unwrap());
            (name.to_string(), function)
        })
        .collect()
}

fn inputs(expr: &str, functions: &FunctionTable, match_features: &[&str]) -> Vec<String> {
    let match_features: IndexSet<Reference> = match_features
        .iter()
        .map(|f| Reference::parse(f).unwrap())
        .collect();
    let constants: IndexSet<String> = ["weights".to_string()].into_iter().collect();
    global_phase_inputs(&Expr::parse(expr).unwrap(), functions, &match_features, &constants)
        .into_iter()
        .collect()
}

#[test]
fn follows_functions_and_skips_constants_and_queries() {
    let table = functions(&[
        ("doc_score", &[], "attribute(popularity) * bm25(title)"),
        ("scaled", &["x"], "x * attribute(boost)"),
        ("matched", &[], "nativeRank"),
    ]);
    let found = inputs(
        "doc_score + scaled(fieldMatch(body)) + matched + query(q) + constant(c) + weights \
         + reduce(map(attribute(t), f(v)(v * 2)), sum)",
        &table,
        &["matched"],
    );
    assert_eq!(
        found,
        [
            "attribute(popularity)",
            "bm25(title)",
            "fieldMatch(body)",
            "attribute(boost)",
            "matched",
            "attribute(t)",
        ]
    );
}

#[test]
fn bound_simple_features_are_substituted() {
    let table = functions(&[("field_value", &["name"], "attribute(name)")]);
    assert_eq!(
        inputs("field_value(price) * 2", &table, &[]),
        ["attribute(price)"]
    );
}

#[test]
fn recursive_functions_terminate() {
    let table = functions(&[("f", &[], "f + attribute(a)")]);
    assert_eq!(inputs("f", &table, &[]), ["attribute(a)"]);
}
