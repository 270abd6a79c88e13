//! Test: errors surface without partial state

use crate::helpers::*;
use featurepipe::{ErrorKind, FeatureError, Params, Table};

/// A failing build stores nothing and leaves the pipeline untouched
#[test]
fn test_build_failure_is_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_in(dir.path(), seed_table(3));
    pipeline
        .pipe_builder(CountingGroup::new("A", "a", &["x"]), Params::new(), None)
        .unwrap();
    let before = pipeline.features_df().clone();

    let err = pipeline
        .pipe_builder(FailingGroup { name: "Broken".to_string() }, Params::new(), None)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::Build);
    assert!(err.to_string().contains("Broken could not be computed"));
    assert_eq!(pipeline.features_df(), &before);
    assert!(!cache_file(dir.path(), "Broken").exists());
    assert_eq!(pipeline.piped_groups(), &["A".to_string()]);
}

/// Output missing the merge key is rejected before it is cached
#[test]
fn test_output_without_key_rejected() {
    struct Keyless;

    impl featurepipe::FeatureBuilder for Keyless {
        fn prefix(&self) -> &str {
            "k"
        }

        fn build_step(
            &self,
            seed: &Table,
            _merge_on: &featurepipe::MergeKey,
            _params: &Params,
        ) -> anyhow::Result<Table> {
            Ok(seed.select(&["label"])?)
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_in(dir.path(), seed_table(2));

    let err = pipeline.pipe_builder(Keyless, Params::new(), None).err().unwrap();

    assert!(matches!(err, FeatureError::InvalidOutput { .. }));
    assert!(!cache_file(dir.path(), "Keyless").exists());
}

/// A corrupt entry is a storage error, not a silent rebuild
#[test]
fn test_corrupt_entry_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(cache_file(dir.path(), "A"), "id,a_x\n1,2,3\n").unwrap();

    let group = CountingGroup::new("A", "a", &["x"]);
    let counter = group.counter();
    let mut pipeline = pipeline_in(dir.path(), seed_table(2));

    let err = pipeline.pipe_builder(group, Params::new(), None).err().unwrap();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(calls(&counter), 0);
}

/// Piping the same group twice would clash on every column
#[test]
fn test_same_group_twice_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_in(dir.path(), seed_table(2));
    pipeline
        .pipe_builder(CountingGroup::new("A", "a", &["x"]), Params::new(), None)
        .unwrap();

    let err = pipeline
        .pipe_builder(CountingGroup::new("A", "a", &["x"]), Params::new(), None)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_columns(pipeline.features_df(), &["id", "label", "a_x"]);
}

/// Duplicate keys in a group's output cannot be merged
#[test]
fn test_duplicate_feature_keys_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_in(dir.path(), seed_table(3));

    let err = pipeline
        .pipe_builder(SubsetGroup { keep: vec![2, 2] }, Params::new(), None)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::Merge);
    assert_eq!(pipeline.features_df(), &seed_table(3));
}

/// Keys of another type than the seed's are a merge error, not a column of nulls
#[test]
fn test_key_type_mismatch_rejected() {
    struct NumericIds;

    impl featurepipe::FeatureBuilder for NumericIds {
        fn prefix(&self) -> &str {
            "n"
        }

        fn build_step(
            &self,
            _seed: &Table,
            _merge_on: &featurepipe::MergeKey,
            _params: &Params,
        ) -> anyhow::Result<Table> {
            Ok(Table::new()
                .with_column("id", [1, 2, 10])?
                .with_column("v", ["7", "7", "7"])?)
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_in(dir.path(), string_keyed_seed());

    let err = pipeline.pipe_builder(NumericIds, Params::new(), None).err().unwrap();

    assert_eq!(err.kind(), ErrorKind::Merge);
    assert_eq!(pipeline.features_df(), &string_keyed_seed());
}
