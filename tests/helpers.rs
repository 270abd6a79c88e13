//! Test utility functions for featurepipe

#![allow(dead_code)]

use featurepipe::{FeatureBuilder, MergeKey, Params, Pipeline, Table, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builder that counts its build calls and emits fixed columns
///
/// Every column in `columns` gets `row_value * scale` for each seed row,
/// where `row_value` is the seed's `id`.
pub struct CountingGroup {
    name: String,
    prefix: String,
    columns: Vec<String>,
    scale: i64,
    calls: Arc<AtomicUsize>,
}

impl CountingGroup {
    pub fn new(name: &str, prefix: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            scale: 1,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_scale(mut self, scale: i64) -> Self {
        self.scale = scale;
        self
    }

    /// Share a call counter with other instances
    pub fn with_counter(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = calls;
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl FeatureBuilder for CountingGroup {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn build_step(&self, seed: &Table, merge_on: &MergeKey, _params: &Params) -> anyhow::Result<Table> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let ids = seed
            .column("id")
            .ok_or_else(|| anyhow::anyhow!("seed has no id column"))?;
        let mut table = seed.select(merge_on.columns())?;
        for column in &self.columns {
            let values: Vec<Value> = ids
                .values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Value::Int(i * self.scale),
                    _ => Value::Null,
                })
                .collect();
            table = table.with_column(column.as_str(), values)?;
        }
        Ok(table)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Builder whose build step always fails
pub struct FailingGroup {
    pub name: String,
}

impl FeatureBuilder for FailingGroup {
    fn prefix(&self) -> &str {
        "fail"
    }

    fn build_step(&self, _seed: &Table, _merge_on: &MergeKey, _params: &Params) -> anyhow::Result<Table> {
        anyhow::bail!("{} could not be computed", self.name)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Builder that returns only the rows whose id is in `keep`
pub struct SubsetGroup {
    pub keep: Vec<i64>,
}

impl FeatureBuilder for SubsetGroup {
    fn prefix(&self) -> &str {
        "sub"
    }

    fn build_step(&self, _seed: &Table, _merge_on: &MergeKey, _params: &Params) -> anyhow::Result<Table> {
        let vals: Vec<i64> = self.keep.iter().map(|id| id * 10).collect();
        Ok(Table::new()
            .with_column("id", self.keep.clone())?
            .with_column("val", vals)?)
    }

    fn name(&self) -> String {
        "SubsetGroup".to_string()
    }
}

/// Builder that copies the named seed columns next to the key
pub struct CopyGroup {
    pub name: String,
    pub prefix: String,
    pub columns: Vec<String>,
    pub calls: Arc<AtomicUsize>,
}

impl CopyGroup {
    pub fn new(name: &str, prefix: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_counter(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = calls;
        self
    }
}

impl FeatureBuilder for CopyGroup {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn build_step(&self, seed: &Table, merge_on: &MergeKey, _params: &Params) -> anyhow::Result<Table> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut names: Vec<&str> = merge_on.columns().iter().map(String::as_str).collect();
        names.extend(self.columns.iter().map(String::as_str));
        Ok(seed.select(&names)?)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Seed keyed by zero-padded string ids, with cells that look like other types
pub fn string_keyed_seed() -> Table {
    Table::new()
        .with_column("id", ["001", "002", "010"])
        .unwrap()
        .with_column("code", ["7", "true", ""])
        .unwrap()
        .with_column("ratio", [Some(0.5), None, Some(3.0)])
        .unwrap()
        .with_column(
            "mixed",
            vec![Value::Int(1), Value::from("1"), Value::Float(1.0)],
        )
        .unwrap()
}

/// Seed table with `id` 1..=n and a `label` column
pub fn seed_table(n: i64) -> Table {
    let ids: Vec<i64> = (1..=n).collect();
    let labels: Vec<String> = ids.iter().map(|id| format!("row{}", id)).collect();
    Table::new()
        .with_column("id", ids)
        .unwrap()
        .with_column("label", labels)
        .unwrap()
}

pub fn id_key() -> MergeKey {
    MergeKey::new(["id"]).unwrap()
}

pub fn pipeline_in(dir: &Path, seed: Table) -> Pipeline {
    Pipeline::new(seed, id_key(), dir).unwrap()
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Assert that `table` has exactly these column names, in order
pub fn assert_columns(table: &Table, expected: &[&str]) {
    let actual: Vec<&str> = table.column_names().collect();
    assert_eq!(actual, expected, "unexpected columns");
}

pub fn cache_file(dir: &Path, group: &str) -> std::path::PathBuf {
    dir.join(format!("{}_features_cache.csv", group))
}
