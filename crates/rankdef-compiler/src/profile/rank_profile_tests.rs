use rankdef_core::TensorType;

use crate::Error;
use crate::profile::{
    Constant, ConstantValue, Input, OnnxModel, Owner, RankProfile, RankSetting, RankSettingKind,
    RankingExpressionFunction,
};
use crate::reference::{FeatureList, Reference};

fn tensor(text: &str) -> TensorType {
    TensorType::parse(text).unwrap()
}

fn global(name: &str) -> RankProfile {
    RankProfile::new(name, Owner::Global)
}

#[test]
fn only_default_and_unranked_are_overridable() {
    assert!(global("default").is_overridable());
    assert!(global("unranked").is_overridable());
    assert!(!global("default-ish").is_overridable());
}

#[test]
fn phase_syntax_errors_surface_when_set() {
    let mut profile = global("p");
    let err = profile.set_first_phase("attribute(x) +").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(profile.first_phase.is_none());
}

#[test]
fn duplicate_function_is_rejected() {
    let mut profile = global("p");
    let f = RankingExpressionFunction::parse("f", &[], "1", false).unwrap();
    profile.add_function(f.clone()).unwrap();
    let err = profile.add_function(f).unwrap_err();
    assert_eq!(err.to_string(), "function 'f' is already defined in rank profile 'p'");
}

#[test]
fn equal_constant_may_be_added_twice() {
    let mut profile = global("p");
    let constant = || {
        Constant::new("w", tensor("tensor(x[2])"), ConstantValue::Inline("[1,2]".into())).unwrap()
    };
    profile.add_constant(constant()).unwrap();
    profile.add_constant(constant()).unwrap();
    assert_eq!(profile.constants.len(), 1);

    let different =
        Constant::new("w", tensor("tensor(x[2])"), ConstantValue::Inline("[3,4]".into())).unwrap();
    let err = profile.add_constant(different).unwrap_err();
    assert_eq!(err.to_string(), "constant 'w' is already defined in rank profile 'p'");
}

#[test]
fn constant_needs_bound_dense_dimensions() {
    let err = Constant::new("w", tensor("tensor(x[])"), ConstantValue::File("w.json".into()))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "constant 'w' has type tensor(x[]), but dense tensor dimensions must have a size"
    );
}

#[test]
fn constants_are_keyed_by_feature_reference() {
    let mut profile = global("p");
    profile
        .add_constant(
            Constant::new("w", TensorType::empty(), ConstantValue::Inline("1.5".into())).unwrap(),
        )
        .unwrap();
    assert!(profile.constants.contains_key(&Reference::simple("constant", "w")));
}

#[test]
fn query_input_is_keyed_by_query_feature() {
    let mut profile = global("p");
    profile
        .add_query_input("embedding", tensor("tensor<float>(x[4])"))
        .unwrap();

    let input = &profile.inputs[&Reference::simple("query", "embedding")];
    assert_eq!(input.tensor_type.to_string(), "tensor<float>(x[4])");
    assert_eq!(input.default_value, None);
}

#[test]
fn conflicting_input_is_rejected() {
    let mut profile = global("p");
    let name = Reference::simple("query", "q");
    profile.add_input(Input::new(name.clone(), TensorType::empty())).unwrap();
    let err = profile
        .add_input(Input::new(name, TensorType::empty()).with_default("1"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "input 'query(q)' is already defined in rank profile 'p'"
    );
}

#[test]
fn duplicate_onnx_model_is_rejected() {
    let mut profile = global("p");
    profile.add_onnx_model(OnnxModel::new("m", "m.onnx")).unwrap();
    let err = profile.add_onnx_model(OnnxModel::new("m", "other.onnx")).unwrap_err();
    assert_eq!(err.to_string(), "onnx model 'm' is already defined in rank profile 'p'");
}

#[test]
fn inherited_features_require_a_declared_parent() {
    let mut profile = global("p");
    profile.inherit("base");
    profile.set_inherited_summary_features("base").unwrap();
    assert!(profile.set_inherited_match_features("other").is_err());
}

#[test]
fn feature_lists_accumulate_without_duplicates() {
    let mut profile = global("p");
    profile.add_match_features(FeatureList::parse("bm25(title), attribute(a)").unwrap());
    profile.add_match_features(FeatureList::parse("attribute(a) attribute(b)").unwrap());

    let names: Vec<String> = profile
        .match_features
        .iter()
        .flatten()
        .map(Reference::to_string)
        .collect();
    assert_eq!(names, ["bm25(title)", "attribute(a)", "attribute(b)"]);
}

#[test]
fn rank_setting_for_same_field_and_kind_is_replaced() {
    let mut profile = global("p");
    profile.add_rank_setting(RankSetting::new("title", RankSettingKind::Weight, "100"));
    profile.add_rank_setting(RankSetting::new("title", RankSettingKind::LiteralBoost, "10"));
    profile.add_rank_setting(RankSetting::new("title", RankSettingKind::Weight, "150"));

    let values: Vec<&str> = profile.rank_settings.values().map(|s| s.value.as_str()).collect();
    assert_eq!(values, ["150", "10"]);
}

#[test]
fn rank_properties_keep_every_value_per_name() {
    let mut profile = global("p");
    profile.add_rank_property("vespa.feature", "a");
    profile.add_rank_property("vespa.feature", "b");
    assert_eq!(profile.rank_properties["vespa.feature"].len(), 2);
}
