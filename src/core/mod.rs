//! Core domain models
//!
//! Tables, merge keys, parameter bundles, errors and the YAML pipeline
//! configuration.

pub mod config;
pub mod error;
pub mod key;
pub mod params;
pub mod table;

pub use error::{ErrorKind, FeatureError};
pub use key::MergeKey;
pub use params::Params;
pub use table::{Column, Table, TableError, Value};
