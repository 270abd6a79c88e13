//! Feature groups over the iris measurements
//!
//! The seed table is expected to carry `sepal_length`, `sepal_width`,
//! `petal_length` and `petal_width` next to its key columns.

use crate::core::{MergeKey, Params, Table, Value};
use crate::execution::FeatureBuilder;
use anyhow::Context;
use tracing::info;

/// Squared sepal and petal lengths
#[derive(Debug, Default)]
pub struct Lengths;

impl FeatureBuilder for Lengths {
    fn prefix(&self) -> &str {
        "lengths"
    }

    fn build_step(&self, seed: &Table, merge_on: &MergeKey, params: &Params) -> anyhow::Result<Table> {
        if let Some(custom) = params.get_named("some_custom_param") {
            info!("{} will be used to calculate Lengths features", custom);
        }

        let sepal = numeric(seed, "sepal_length")?;
        let petal = numeric(seed, "petal_length")?;

        let table = seed
            .select(merge_on.columns())?
            .with_column("sepal_squared", map(&sepal, |x| x * x))?
            .with_column("petal_squared", map(&petal, |x| x * x))?;
        Ok(table)
    }
}

/// Sum of sepal and petal widths
#[derive(Debug, Default)]
pub struct Widths;

impl FeatureBuilder for Widths {
    fn prefix(&self) -> &str {
        "widths"
    }

    fn build_step(&self, seed: &Table, merge_on: &MergeKey, _params: &Params) -> anyhow::Result<Table> {
        let sepal = numeric(seed, "sepal_width")?;
        let petal = numeric(seed, "petal_width")?;

        let sums: Vec<Value> = sepal
            .iter()
            .zip(&petal)
            .map(|(s, p)| match (s, p) {
                (Some(s), Some(p)) => Value::Float(s + p),
                _ => Value::Null,
            })
            .collect();

        Ok(seed
            .select(merge_on.columns())?
            .with_column("sepal_plus_petal", sums)?)
    }
}

/// Column as floats; non-numeric cells become `None`
fn numeric(table: &Table, name: &str) -> anyhow::Result<Vec<Option<f64>>> {
    let column = table
        .column(name)
        .with_context(|| format!("seed table has no '{}' column", name))?;
    Ok(column
        .values
        .iter()
        .map(|v| match v {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        })
        .collect())
}

fn map(values: &[Option<f64>], f: impl Fn(f64) -> f64) -> Vec<Value> {
    values
        .iter()
        .map(|v| v.map(&f).map_or(Value::Null, Value::Float))
        .collect()
}
