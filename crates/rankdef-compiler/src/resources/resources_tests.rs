use std::sync::Arc;
use std::thread;

use rankdef_core::TensorType;

use super::{
    DistributableResource, InMemoryFileRegistry, LargeRankingExpressions, OnnxModels,
    RankingConstants, RankingExpressionBody,
};
use crate::profile::{Constant, ConstantValue, OnnxModel};

fn expressions(limit: usize) -> (Arc<InMemoryFileRegistry>, LargeRankingExpressions) {
    let files = Arc::new(InMemoryFileRegistry::new());
    let registry = LargeRankingExpressions::new(files.clone(), limit);
    (files, registry)
}

#[test]
fn first_registration_is_distributed() {
    let (files, registry) = expressions(1024);
    let body = registry
        .add(RankingExpressionBody::new("s.p.f.expression", "a + b"))
        .unwrap();

    let reference = body.file_reference().expect("distributed");
    assert_eq!(files.blob(reference).unwrap(), b"a + b");
    assert_eq!(registry.len(), 1);
}

#[test]
fn identical_duplicate_returns_the_registered_value() {
    let (files, registry) = expressions(1024);
    let first = registry.add(RankingExpressionBody::new("e", "x * 2")).unwrap();
    let second = registry.add(RankingExpressionBody::new("e", "x * 2")).unwrap();

    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
    assert_eq!(files.len(), 1);
}

#[test]
fn differing_duplicate_is_rejected_with_sizes() {
    let (_, registry) = expressions(1024);
    registry.add(RankingExpressionBody::new("e", "abc")).unwrap();
    let err = registry.add(RankingExpressionBody::new("e", "abcde")).unwrap_err();

    assert_eq!(
        err.to_string(),
        "ranking expression 'e' defined twice: previous blob has 3 bytes, while current has 5 bytes"
    );
}

#[test]
fn oversized_content_is_rejected() {
    let (files, registry) = expressions(4);
    let err = registry.add(RankingExpressionBody::new("e", "a + b + c")).unwrap_err();

    assert_eq!(
        err.to_string(),
        "invalid ranking expression 'e': 9 bytes exceeds the limit of 4 bytes"
    );
    assert!(registry.is_empty());
    assert!(files.is_empty());
}

#[test]
fn inline_constants_are_not_distributed() {
    let files = Arc::new(InMemoryFileRegistry::new());
    let registry = RankingConstants::new(files, 1024);
    let constant = Constant::new(
        "w",
        TensorType::parse("tensor(x[2])").unwrap(),
        ConstantValue::Inline("[1, 2]".into()),
    )
    .unwrap();

    let err = registry.add(constant).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid ranking constant 'w': inline constants are not distributed as files"
    );
}

#[test]
fn file_constant_gets_a_file_reference() {
    let files = Arc::new(InMemoryFileRegistry::new());
    let registry = RankingConstants::new(files.clone(), 1024);
    let constant = Constant::new(
        "w",
        TensorType::parse("tensor(x{})").unwrap(),
        ConstantValue::File("constants/w.json".into()),
    )
    .unwrap();

    let registered = registry.add(constant).unwrap();
    assert!(registered.file_reference().is_some());
    assert_eq!(registry.get("w"), Some(registered));
}

#[test]
fn onnx_model_without_file_is_rejected() {
    let registry = OnnxModels::new(Arc::new(InMemoryFileRegistry::new()), 1024);
    let err = registry.add(OnnxModel::new("m", " ")).unwrap_err();

    assert_eq!(err.to_string(), "invalid onnx model 'm': no model file given");
}

#[test]
fn all_is_sorted_by_name() {
    let (_, registry) = expressions(1024);
    for name in ["c", "a", "b"] {
        registry.add(RankingExpressionBody::new(name, "1")).unwrap();
    }
    let names: Vec<String> = registry.all().iter().map(|r| r.name().to_owned()).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn concurrent_registration_of_one_name_distributes_once() {
    let (files, registry) = expressions(1024);
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                registry
                    .add(RankingExpressionBody::new("shared", "reduce(t, sum)"))
                    .unwrap()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(registry.len(), 1);
    assert_eq!(files.len(), 1);
}
