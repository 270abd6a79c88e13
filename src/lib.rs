//! featurepipe - cacheable feature groups merged into one table
//!
//! Split a feature-engineering workload into [`FeatureBuilder`]s, each
//! cached on disk under its own name, then compose any subset of them with a
//! [`Pipeline`]:
//!
//! ```no_run
//! use featurepipe::{FeatureBuilder, MergeKey, Params, Pipeline, Table};
//!
//! #[derive(Default)]
//! struct Doubled;
//!
//! impl FeatureBuilder for Doubled {
//!     fn prefix(&self) -> &str {
//!         "dbl"
//!     }
//!
//!     fn build_step(&self, seed: &Table, merge_on: &MergeKey, _params: &Params) -> anyhow::Result<Table> {
//!         Ok(seed.select(merge_on.columns())?.with_column("x", [2, 4, 6])?)
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let seed = Table::new().with_column("id", [1, 2, 3])?;
//! let mut pipeline = Pipeline::new(seed, MergeKey::new(["id"])?, "features")?;
//! pipeline.pipe::<Doubled>(Params::new())?;
//! println!("{}", pipeline.features_df());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod demo;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use core::{Column, ErrorKind, FeatureError, MergeKey, Params, Table, TableError, Value};
pub use execution::{CacheOutcome, FeatureBuilder, FeatureCache, FeatureGroup, GroupRegistry, GroupSettings, Pipeline};
pub use persistence::{
    CacheLocation, DelimitedTextBackend, InMemoryBackend, JsonBackend, StorageBackend, StorageError,
};
