//! Test: re-running a pipeline against a warm cache directory

use crate::helpers::*;
use featurepipe::{CacheOutcome, FeatureGroup, GroupSettings, Params, Value};
use pretty_assertions::assert_eq;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

fn run_once(dir: &std::path::Path, a: &Arc<AtomicUsize>, b: &Arc<AtomicUsize>) -> featurepipe::Table {
    let mut pipeline = pipeline_in(dir, seed_table(4));
    pipeline
        .pipe_builder(
            CountingGroup::new("A", "a", &["x"]).with_counter(a.clone()),
            Params::new(),
            None,
        )
        .unwrap()
        .pipe_builder(
            CountingGroup::new("B", "b", &["x", "y"]).with_scale(3).with_counter(b.clone()),
            Params::new(),
            None,
        )
        .unwrap();
    pipeline.into_features_df()
}

/// A second run over the same directory builds nothing and gives the same table
#[test]
fn test_idempotent_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));

    let first = run_once(dir.path(), &a, &b);
    let second = run_once(dir.path(), &a, &b);

    assert_eq!(first, second);
    assert_eq!(calls(&a), 1);
    assert_eq!(calls(&b), 1);
}

/// Forcing one step rebuilds only that step
#[test]
fn test_per_step_force_reload() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));
    run_once(dir.path(), &a, &b);

    let mut pipeline = pipeline_in(dir.path(), seed_table(4));
    pipeline
        .pipe_builder(
            CountingGroup::new("A", "a", &["x"]).with_counter(a.clone()),
            Params::new(),
            Some(true),
        )
        .unwrap()
        .pipe_builder(
            CountingGroup::new("B", "b", &["x", "y"]).with_counter(b.clone()),
            Params::new(),
            None,
        )
        .unwrap();

    assert_eq!(calls(&a), 2);
    assert_eq!(calls(&b), 1);
}

/// After reset the same groups can be piped again, served from cache
#[test]
fn test_reset_then_pipe_again() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(AtomicUsize::new(0));
    let mut pipeline = pipeline_in(dir.path(), seed_table(2));

    pipeline
        .pipe_builder(CountingGroup::new("A", "a", &["x"]).with_counter(a.clone()), Params::new(), None)
        .unwrap();
    let first = pipeline.features_df().clone();
    pipeline.reset();
    pipeline
        .pipe_builder(CountingGroup::new("A", "a", &["x"]).with_counter(a.clone()), Params::new(), None)
        .unwrap();

    assert_eq!(pipeline.features_df(), &first);
    assert_eq!(calls(&a), 1);
}

fn run_string_keyed(dir: &std::path::Path, builds: &Arc<AtomicUsize>) -> featurepipe::Table {
    let mut pipeline = pipeline_in(dir, string_keyed_seed());
    pipeline
        .pipe_builder(
            CopyGroup::new("Codes", "c", &["code", "ratio", "mixed"]).with_counter(builds.clone()),
            Params::new(),
            None,
        )
        .unwrap();
    pipeline.into_features_df()
}

/// String keys and look-alike cells come back from the default backend unchanged
#[test]
fn test_rerun_with_string_keys() {
    let dir = tempfile::tempdir().unwrap();
    let builds = Arc::new(AtomicUsize::new(0));

    let first = run_string_keyed(dir.path(), &builds);
    let second = run_string_keyed(dir.path(), &builds);

    assert_eq!(calls(&builds), 1);
    assert_eq!(first, second);
    assert_eq!(
        second.column("c_code").unwrap().values,
        vec![Value::from("7"), Value::from("true"), Value::from("")]
    );
    assert_eq!(
        second.column("c_ratio").unwrap().values,
        vec![Value::Float(0.5), Value::Null, Value::Float(3.0)]
    );
}

/// A loaded entry equals the table the build produced, cell type for cell type
#[test]
fn test_loaded_entry_matches_fresh_build() {
    let dir = tempfile::tempdir().unwrap();
    let seed = string_keyed_seed();
    let key = id_key();

    let mut fresh = FeatureGroup::new(
        CopyGroup::new("Codes", "c", &["code", "ratio", "mixed"]),
        GroupSettings::new(dir.path(), key.clone()),
    )
    .unwrap();
    let built = fresh.resolve(&seed, &Params::new()).unwrap();
    assert_eq!(fresh.last_outcome(), Some(CacheOutcome::Built));

    let mut reader = FeatureGroup::new(
        CopyGroup::new("Codes", "c", &["code", "ratio", "mixed"]),
        GroupSettings::new(dir.path(), key),
    )
    .unwrap();
    let loaded = reader.resolve(&seed, &Params::new()).unwrap();

    assert_eq!(reader.last_outcome(), Some(CacheOutcome::Loaded));
    assert_eq!(loaded, built);
    assert_eq!(
        loaded.column("c_mixed").unwrap().values,
        vec![Value::Int(1), Value::from("1"), Value::Float(1.0)]
    );
}
