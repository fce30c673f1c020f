use std::io::Write;

use crate::config::{CompilerConfig, DEFAULT_LARGE_EXPRESSION_THRESHOLD, DEFAULT_MAX_RESOURCE_SIZE};

#[test]
fn missing_keys_keep_defaults() {
    let config = CompilerConfig::from_json(r#"{ "large-expression-threshold": 100 }"#).unwrap();

    assert_eq!(config.large_expression_threshold, 100);
    assert_eq!(config.max_resource_size, DEFAULT_MAX_RESOURCE_SIZE);
    assert!(config.warn_undeclared_query_features);
}

#[test]
fn empty_object_is_the_default() {
    assert_eq!(CompilerConfig::from_json("{}").unwrap(), CompilerConfig::default());
    assert_eq!(
        CompilerConfig::new().large_expression_threshold,
        DEFAULT_LARGE_EXPRESSION_THRESHOLD
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let err = CompilerConfig::from_json(r#"{ "threshold": 1 }"#).unwrap_err();
    assert!(err.to_string().starts_with("invalid configuration: unknown field `threshold`"));
}

#[test]
fn threshold_may_not_exceed_resource_size() {
    let err = CompilerConfig::from_json(
        r#"{ "large-expression-threshold": 10, "max-resource-size": 5 }"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: large-expression-threshold (10) exceeds max-resource-size (5)"
    );
}

#[test]
fn builders_override_fields() {
    let config = CompilerConfig::new()
        .with_large_expression_threshold(1)
        .with_max_resource_size(2)
        .with_warn_undeclared_query_features(false);
    assert_eq!(
        (config.large_expression_threshold, config.max_resource_size),
        (1, 2)
    );
    assert!(!config.warn_undeclared_query_features);
}

#[test]
fn load_reads_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "warn-undeclared-query-features": false }}"#).unwrap();

    let config = CompilerConfig::load(file.path()).unwrap();
    assert!(!config.warn_undeclared_query_features);
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let err = CompilerConfig::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("could not read '"));
}
