//! Merge key shared by the seed table and every feature group

use crate::core::{error::FeatureError, table::Table};
use std::collections::HashSet;
use std::fmt;

/// Ordered, non-empty set of column names used to align rows
///
/// Key columns are never prefixed when a group's output is renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeKey(Vec<String>);

impl MergeKey {
    /// Create a merge key, rejecting empty or repeated column names
    pub fn new<I, S>(columns: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(FeatureError::Configuration(
                "merge_on must name at least one column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.is_empty() {
                return Err(FeatureError::Configuration(
                    "merge_on contains an empty column name".to_string(),
                ));
            }
            if !seen.insert(column.as_str()) {
                return Err(FeatureError::Configuration(format!(
                    "merge_on lists column '{}' more than once",
                    column
                )));
            }
        }

        Ok(Self(columns))
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }

    /// Key columns absent from `table`, in key order
    pub fn missing_from(&self, table: &Table) -> Vec<String> {
        self.0
            .iter()
            .filter(|c| !table.has_column(c))
            .cloned()
            .collect()
    }

    /// Column indices of the key inside `table`, if all are present
    pub fn indices_in(&self, table: &Table) -> Option<Vec<usize>> {
        self.0.iter().map(|c| table.column_index(c)).collect()
    }
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
