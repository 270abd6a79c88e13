//! CLI command definitions

use crate::core::config::{default_data_dir, StorageFormat};
use clap::Args;
use std::path::PathBuf;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Seed table, overriding the configured input
    #[arg(long)]
    pub input: Option<String>,

    /// Write the merged table here (.csv, .tsv or .json) instead of printing it
    #[arg(short, long)]
    pub output: Option<String>,

    /// Rebuild every group, ignoring existing cache entries
    #[arg(long)]
    pub force_reload: bool,

    /// Print the merged table as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List cache entries
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Cache directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Print one cached table
#[derive(Debug, Args, Clone)]
pub struct ShowCommand {
    /// Feature group name
    pub group: String,

    /// Cache directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Storage format of the entry
    #[arg(long, value_enum, default_value_t = StorageFormat::Csv)]
    pub format: StorageFormat,

    /// Number of rows to print
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,
}

/// Delete cache entries so their groups are rebuilt on next use
#[derive(Debug, Args, Clone)]
pub struct InvalidateCommand {
    /// Feature group names
    #[arg(required = true)]
    pub groups: Vec<String>,

    /// Cache directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Storage format of the entries
    #[arg(long, value_enum, default_value_t = StorageFormat::Csv)]
    pub format: StorageFormat,
}

/// The given directory, or the default cache directory
pub fn resolve_data_dir(data_dir: &Option<PathBuf>) -> PathBuf {
    data_dir.clone().unwrap_or_else(default_data_dir)
}
