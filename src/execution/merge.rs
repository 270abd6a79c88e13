//! Left-merge of a group's features into the accumulated table

use crate::core::{Column, FeatureError, MergeKey, Table, Value};
use std::collections::{BTreeSet, HashMap};

/// Join `right` onto `left` on `on`, keeping every row of `left` in order
///
/// Rows of `left` without a match get `Null` in the new columns. Keys must be
/// unique in `right`, hold the same value types as in `left`, and `right`'s
/// non-key columns must not already exist in `left`; any violation is a merge
/// error and nothing is returned.
pub fn left_merge(left: &Table, right: &Table, on: &MergeKey) -> Result<Table, FeatureError> {
    let left_keys = on.indices_in(left).ok_or_else(|| {
        FeatureError::Merge(format!(
            "accumulated table is missing merge-key column(s): {}",
            on.missing_from(left).join(", ")
        ))
    })?;
    let right_keys = on.indices_in(right).ok_or_else(|| {
        FeatureError::Merge(format!(
            "feature table is missing merge-key column(s): {}",
            on.missing_from(right).join(", ")
        ))
    })?;

    for (&l, &r) in left_keys.iter().zip(&right_keys) {
        check_key_types(&left.columns()[l], &right.columns()[r])?;
    }

    let new_columns: Vec<&Column> = right
        .columns()
        .iter()
        .filter(|c| !on.contains(&c.name))
        .collect();
    if let Some(clash) = new_columns.iter().find(|c| left.has_column(&c.name)) {
        return Err(FeatureError::Merge(format!(
            "column '{}' already exists in the accumulated table",
            clash.name
        )));
    }

    let mut index: HashMap<Vec<&Value>, usize> = HashMap::with_capacity(right.num_rows());
    for row in 0..right.num_rows() {
        let key = key_at(right, &right_keys, row);
        if index.insert(key, row).is_some() {
            return Err(FeatureError::Merge(format!(
                "duplicate merge key ({}) in feature table",
                render_key(right, &right_keys, row)
            )));
        }
    }

    let matches: Vec<Option<usize>> = (0..left.num_rows())
        .map(|row| index.get(&key_at(left, &left_keys, row)).copied())
        .collect();

    let mut merged = left.clone();
    for column in new_columns {
        let values = matches
            .iter()
            .map(|m| m.map_or(Value::Null, |row| column.values[row].clone()))
            .collect();
        merged
            .push_column(Column {
                name: column.name.clone(),
                values,
            })
            .map_err(|e| FeatureError::Merge(e.to_string()))?;
    }

    Ok(merged)
}

/// Keys of a type the left side never holds can't match anything
fn check_key_types(left: &Column, right: &Column) -> Result<(), FeatureError> {
    let left_types = value_types(left);
    if left_types.is_empty() {
        return Ok(());
    }
    let right_types = value_types(right);
    if let Some(stray) = right_types.difference(&left_types).next() {
        return Err(FeatureError::Merge(format!(
            "merge-key column '{}' holds {} values in the feature table but only {} values in the accumulated table",
            left.name,
            stray,
            left_types.iter().copied().collect::<Vec<_>>().join("/")
        )));
    }
    Ok(())
}

fn value_types(column: &Column) -> BTreeSet<&'static str> {
    column
        .values
        .iter()
        .filter(|v| !v.is_null())
        .map(Value::type_name)
        .collect()
}

fn key_at<'a>(table: &'a Table, key_columns: &[usize], row: usize) -> Vec<&'a Value> {
    key_columns
        .iter()
        .map(|&c| &table.columns()[c].values[row])
        .collect()
}

fn render_key(table: &Table, key_columns: &[usize], row: usize) -> String {
    key_columns
        .iter()
        .map(|&c| {
            let column = &table.columns()[c];
            format!("{}={}", column.name, column.values[row])
        })
        .collect::<Vec<_>>()
        .join(", ")
}
