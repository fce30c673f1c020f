use rankdef_core::TensorType;

use super::type_context::{FunctionTable, TypeContext};
use crate::Error;
use crate::expr::{Expr, ExpressionFunction};
use crate::reference::Reference;
use crate::reference::feature_names::{as_attribute_feature, as_constant_feature, as_query_feature};

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

fn t(spec: &str) -> TensorType {
    TensorType::parse(spec).unwrap()
}

fn r(text: &str) -> Reference {
    Reference::parse(text).unwrap()
}

#[test]
fn declared_and_undeclared_features() {
    let ctx = TypeContext::new(FunctionTable::new());
    ctx.set_type(as_query_feature("q"), t("tensor<float>(x[4])"));

    assert_eq!(ctx.get_type(&r("query(q)")).unwrap(), t("tensor<float>(x[4])"));
    assert!(ctx.tensors_are_used());

    assert_eq!(ctx.get_type(&r("query(missing)")).unwrap(), TensorType::empty());
    assert_eq!(ctx.get_type(&r("attribute(missing)")).unwrap(), TensorType::empty());
    assert_eq!(ctx.query_features_not_declared(), vec![as_query_feature("missing")]);
}

#[test]
fn unknown_features_are_scalar() {
    let ctx = TypeContext::new(FunctionTable::new());
    assert_eq!(ctx.get_type(&r("bm25(title)")).unwrap(), TensorType::empty());
    assert_eq!(ctx.get_type(&r("nativeRank")).unwrap(), TensorType::empty());
    assert!(!ctx.tensors_are_used());
}

#[test]
fn function_bodies_are_typed() {
    let ctx = TypeContext::new(functions(&[
        ("embedding", &[], "attribute(embedding)"),
        ("closeness", &[], "reduce(embedding * query(q), sum)"),
    ]));
    ctx.set_type(as_attribute_feature("embedding"), t("tensor<float>(x[8])"));
    ctx.set_type(as_query_feature("q"), t("tensor<float>(x[8])"));

    assert_eq!(ctx.get_type(&r("embedding")).unwrap(), t("tensor<float>(x[8])"));
    assert_eq!(ctx.get_type(&r("closeness")).unwrap(), TensorType::empty());
}

#[test]
fn arguments_bind_through_parent_chain() {
    let ctx = TypeContext::new(functions(&[
        ("field_value", &["a"], "attribute(a)"),
        ("outer", &["b"], "field_value(b)"),
    ]));
    ctx.set_type(as_attribute_feature("embedding"), t("tensor(x[2])"));

    assert_eq!(ctx.get_type(&r("outer(embedding)")).unwrap(), t("tensor(x[2])"));
    assert_eq!(ctx.get_type(&r("outer(other)")).unwrap(), TensorType::empty());
}

#[test]
fn quoted_arguments_bind_to_the_declared_feature() {
    let ctx = TypeContext::new(functions(&[
        ("field_value", &["a"], "attribute(a)"),
        ("outer", &["b"], "field_value(b)"),
        ("model", &["m"], "onnx(m)"),
    ]));
    ctx.set_type(as_attribute_feature("my field"), t("tensor(x[3])"));
    ctx.set_type(Reference::simple("onnx", "my model"), t("tensor<float>(d0[1])"));

    assert_eq!(ctx.get_type(&r("attribute(\"my field\")")).unwrap(), t("tensor(x[3])"));
    assert_eq!(ctx.get_type(&r("field_value(\"my field\")")).unwrap(), t("tensor(x[3])"));
    assert_eq!(ctx.get_type(&r("outer('my field')")).unwrap(), t("tensor(x[3])"));
    assert_eq!(ctx.get_type(&r("model(\"my model\")")).unwrap(), t("tensor<float>(d0[1])"));
}

#[test]
fn digit_leading_names_find_their_declared_type() {
    let ctx = TypeContext::new(functions(&[("field_value", &["a"], "attribute(a)")]));
    ctx.set_type(as_attribute_feature("42"), t("tensor(x[3])"));
    ctx.set_type(as_attribute_feature("0abc"), t("tensor(y{})"));

    assert_eq!(ctx.get_type(&r("attribute(42)")).unwrap(), t("tensor(x[3])"));
    assert_eq!(ctx.get_type(&r("attribute(0abc)")).unwrap(), t("tensor(y{})"));
    assert_eq!(ctx.get_type(&r("field_value(42)")).unwrap(), t("tensor(x[3])"));
}

#[test]
fn bound_expressions_are_typed_in_caller() {
    let ctx = TypeContext::new(functions(&[("scale", &["v"], "v * 2")]));
    ctx.set_type(as_query_feature("q"), t("tensor(x[3])"));

    assert_eq!(ctx.get_type(&r("scale(query(q) + 1)")).unwrap(), t("tensor(x[3])"));
    assert_eq!(ctx.get_type(&r("scale(1)")).unwrap(), TensorType::empty());
}

#[test]
fn zero_argument_functions_resolve_once() {
    let table = functions(&[
        ("g", &[], "attribute(t)"),
        ("f1", &["a"], "g + a"),
        ("f2", &["b"], "g * b"),
    ]);

    let shared = TypeContext::new(table.clone());
    shared.set_type(as_attribute_feature("t"), t("tensor(x[3])"));
    let first = shared.get_type(&r("f1(1)")).unwrap();
    assert_eq!(shared.resolutions(), 4);
    let second = shared.get_type(&r("f2(2)")).unwrap();
    assert_eq!(shared.resolutions(), 6);

    let fresh = TypeContext::new(table);
    fresh.set_type(as_attribute_feature("t"), t("tensor(x[3])"));
    let alone = fresh.get_type(&r("f2(2)")).unwrap();
    assert_eq!(fresh.resolutions(), 4);

    assert_eq!(first, t("tensor(x[3])"));
    assert_eq!(second, alone);
}

#[test]
fn self_reference_is_an_invocation_loop() {
    let ctx = TypeContext::new(functions(&[("f", &[], "f + 1")]));
    let err = ctx.get_type(&r("f")).unwrap_err();
    assert_eq!(err.to_string(), "invocation loop: f -> f");
}

#[test]
fn mutual_recursion_reports_full_path() {
    let ctx = TypeContext::new(functions(&[("f", &[], "g + 1"), ("g", &[], "f * 2")]));
    let err = ctx.get_type(&r("f")).unwrap_err();
    let Error::InvocationLoop(path) = err else {
        panic!("expected invocation loop");
    };
    assert_eq!(path, ["f", "g", "f"]);
}

#[test]
fn onnx_outputs() {
    let ctx = TypeContext::new(FunctionTable::new());
    ctx.set_type(Reference::simple("onnx", "ranker"), t("tensor<float>(d0[1])"));
    ctx.set_type(
        Reference::simple("onnx", "ranker").with_output(Some("logits".into())),
        t("tensor<float>(d0[1],d1[2])"),
    );

    assert_eq!(ctx.get_type(&r("onnx(ranker)")).unwrap(), t("tensor<float>(d0[1])"));
    assert_eq!(
        ctx.get_type(&r("onnx(\"ranker\").logits")).unwrap(),
        t("tensor<float>(d0[1],d1[2])")
    );

    let err = ctx.get_type(&r("onnx(other)")).unwrap_err();
    assert_eq!(err.to_string(), "no ONNX model configuration for 'onnx(other)'");
    assert!(matches!(
        ctx.get_type(&r("onnx(a, b)")),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn token_features() {
    let ctx = TypeContext::new(FunctionTable::new());
    assert_eq!(
        ctx.get_type(&r("tokenInputIds(128, query(tokens), attribute(doc_tokens))"))
            .unwrap()
            .to_string(),
        "tensor<float>(d0[1],d1[128])"
    );
    assert!(ctx.get_type(&r("tokenAttentionMask(8)")).is_err());
    let err = ctx.get_type(&r("tokenTypeIds(size, query(t))")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "tokenTypeIds(size,query(t)): the first argument of tokenTypeIds must be a size, not 'size'"
    );
}

#[test]
fn label_features() {
    let ctx = TypeContext::new(FunctionTable::new());
    assert_eq!(
        ctx.get_type(&r("tensorFromLabels(attribute(tags))")).unwrap(),
        TensorType::mapped("tags")
    );
    assert_eq!(
        ctx.get_type(&r("tensorFromWeightedSet(attribute(weights), key)")).unwrap(),
        TensorType::mapped("key")
    );
    assert!(ctx.get_type(&r("tensorFromLabels(1)")).is_err());
    assert!(ctx.get_type(&r("tensorFromLabels(attribute(a), 1)")).is_err());
}

#[test]
fn bare_constant_names() {
    let ctx = TypeContext::new(FunctionTable::new());
    ctx.set_type(as_constant_feature("weights"), t("tensor(x[2])"));
    ctx.set_type(Reference::identifier("injected"), t("tensor(y{})"));

    assert_eq!(ctx.get_type(&r("weights")).unwrap(), t("tensor(x[2])"));
    assert_eq!(ctx.get_type(&r("injected")).unwrap(), t("tensor(y{})"));
}

#[test]
fn state_is_per_context_tree() {
    let table = functions(&[("g", &[], "query(q)")]);
    let first = TypeContext::new(table.clone());
    first.set_type(as_query_feature("q"), t("tensor(x[1])"));
    assert_eq!(first.get_type(&r("g")).unwrap(), t("tensor(x[1])"));

    let second = TypeContext::new(table);
    assert_eq!(second.get_type(&r("g")).unwrap(), TensorType::empty());
    assert_eq!(second.query_features_not_declared(), vec![as_query_feature("q")]);
    assert!(first.query_features_not_declared().is_empty());
}
