//! Error types for feature resolution and composition

use crate::persistence::StorageError;
use std::fmt;
use thiserror::Error;

/// Error raised while resolving a feature group or composing a pipeline
///
/// Nothing in the engine retries or swallows these; every failure reaches the
/// direct caller of `resolve` or `pipe`.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Invalid prefix, merge key or seed table, detected eagerly
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The user-supplied build step failed; the error is passed through as is
    #[error(transparent)]
    Build(anyhow::Error),

    /// The build step returned a table that breaks the group contract
    #[error("Feature group '{group}' produced invalid output: {reason}")]
    InvalidOutput { group: String, reason: String },

    /// Reading or writing a cache entry failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Rows or columns could not be aligned into the accumulated table
    #[error("Merge error: {0}")]
    Merge(String),
}

/// Coarse classification of a [`FeatureError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Build,
    Storage,
    Merge,
}

impl FeatureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeatureError::Configuration(_) => ErrorKind::Configuration,
            FeatureError::Build(_) | FeatureError::InvalidOutput { .. } => ErrorKind::Build,
            FeatureError::Storage(_) => ErrorKind::Storage,
            FeatureError::Merge(_) => ErrorKind::Merge,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Build => "build",
            ErrorKind::Storage => "storage",
            ErrorKind::Merge => "merge",
        };
        f.write_str(name)
    }
}
