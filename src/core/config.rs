//! Pipeline configuration from YAML

use crate::core::{MergeKey, Params};
use crate::persistence::{DelimitedTextBackend, JsonBackend, StorageBackend};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name (informational)
    #[serde(default)]
    pub name: Option<String>,

    /// Seed table, as delimited text
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Root directory for cache entries
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Columns used to align every group's output with the seed table
    pub merge_on: Vec<String>,

    /// Pipeline-wide force-reload default
    #[serde(default)]
    pub force_reload: bool,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Feature groups, applied in order
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Directory of the file this config was read from (not serialized)
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Storage backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub format: StorageFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl StorageFormat {
    pub fn backend(self) -> Arc<dyn StorageBackend> {
        match self {
            StorageFormat::Csv => Arc::new(DelimitedTextBackend::csv()),
            StorageFormat::Tsv => Arc::new(DelimitedTextBackend::tsv()),
            StorageFormat::Json => Arc::new(JsonBackend::new()),
        }
    }
}

/// One feature group application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Registered group name
    pub group: String,

    /// Positional parameters for the build step
    #[serde(default)]
    pub args: Vec<serde_json::Value>,

    /// Named parameters for the build step
    #[serde(default)]
    pub kwargs: BTreeMap<String, serde_json::Value>,

    /// Overrides the pipeline-wide force-reload default
    #[serde(default)]
    pub force_reload: Option<bool>,
}

impl StepConfig {
    pub fn params(&self) -> Params {
        Params::from_parts(self.args.clone(), self.kwargs.clone())
    }
}

/// `<local data dir>/featurepipe`, or `./featurepipe` when there is none
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("featurepipe")
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    ///
    /// Relative `input` and `data_dir` paths resolve against the file's
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        self.merge_key()?;

        let mut seen_groups = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.group.trim().is_empty() {
                anyhow::bail!("Step {} has an empty group name", index + 1);
            }
            if !seen_groups.insert(step.group.as_str()) {
                anyhow::bail!("Group '{}' is piped more than once", step.group);
            }
        }

        Ok(())
    }

    pub fn merge_key(&self) -> Result<MergeKey> {
        MergeKey::new(self.merge_on.iter().cloned()).context("Invalid merge_on")
    }

    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => self.resolve(dir),
            None => default_data_dir(),
        }
    }

    pub fn input_path(&self) -> Option<PathBuf> {
        self.input.as_deref().map(|p| self.resolve(p))
    }

    pub fn backend(&self) -> Arc<dyn StorageBackend> {
        self.storage.format.backend()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
