//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{InvalidateCommand, ListCommand, RunCommand, ShowCommand, ValidateCommand};
use std::ffi::OsString;

/// Cached feature groups composed into one table
#[derive(Debug, Parser, Clone)]
#[command(name = "featurepipe")]
#[command(author = "featurepipe contributors")]
#[command(version = "0.1.0")]
#[command(about = "Compute, cache and merge feature groups", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline described in YAML
    Run(RunCommand),

    /// Validate a pipeline configuration
    Validate(ValidateCommand),

    /// List cached feature groups
    List(ListCommand),

    /// Print a cached feature table
    Show(ShowCommand),

    /// Delete cached feature tables
    Invalidate(InvalidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
