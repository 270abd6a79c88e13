//! Test: pipelines described in YAML

use crate::helpers::*;
use featurepipe::core::config::PipelineConfig;
use featurepipe::{ErrorKind, GroupRegistry, Value};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

fn registry(a: Arc<AtomicUsize>) -> GroupRegistry {
    let mut registry = GroupRegistry::new();
    registry.register_with("alpha", move || {
        Box::new(CountingGroup::new("Alpha", "al", &["x"]).with_counter(a.clone()))
    });
    registry.register_with("beta", || Box::new(SubsetGroup { keep: vec![1] }));
    registry
}

fn config(dir: &std::path::Path, extra: &str) -> PipelineConfig {
    let yaml = format!(
        r#"
name: "Test: registry run"
data_dir: {}
merge_on: [id]
{}
steps:
  - group: alpha
  - group: beta
"#,
        dir.display(),
        extra
    );
    PipelineConfig::from_yaml(&yaml).unwrap()
}

#[test]
fn test_registry_runs_steps_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(AtomicUsize::new(0));

    let pipeline = registry(a.clone())
        .run(&config(dir.path(), ""), seed_table(2), None)
        .unwrap();

    assert_eq!(pipeline.piped_groups(), &["Alpha".to_string(), "SubsetGroup".to_string()]);
    assert_columns(pipeline.features_df(), &["id", "label", "al_x", "sub_val"]);
    assert_eq!(
        pipeline.features_df().column("sub_val").unwrap().values,
        vec![Value::Int(10), Value::Null]
    );
    assert_eq!(calls(&a), 1);
}

#[test]
fn test_json_storage_format() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(AtomicUsize::new(0));
    let config = config(dir.path(), "storage:\n  format: json");

    registry(a.clone()).run(&config, seed_table(2), None).unwrap();
    registry(a.clone()).run(&config, seed_table(2), None).unwrap();

    assert!(dir.path().join("Alpha_features_cache.json").is_file());
    assert_eq!(calls(&a), 1);
}

#[test]
fn test_override_forces_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(AtomicUsize::new(0));
    let config = config(dir.path(), "");

    registry(a.clone()).run(&config, seed_table(2), None).unwrap();
    registry(a.clone()).run(&config, seed_table(2), Some(true)).unwrap();

    assert_eq!(calls(&a), 2);
}

#[test]
fn test_seed_without_key_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let seed = featurepipe::Table::new().with_column("other", [1]).unwrap();

    let err = registry(Arc::new(AtomicUsize::new(0)))
        .run(&config(dir.path(), ""), seed, None)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::Configuration);
}
