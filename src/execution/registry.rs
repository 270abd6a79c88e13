//! Named feature groups, for pipelines described in configuration

use crate::core::config::PipelineConfig;
use crate::core::{FeatureError, Table};
use crate::execution::group::FeatureBuilder;
use crate::execution::pipeline::Pipeline;
use std::collections::BTreeMap;
use tracing::info;

/// Creates a fresh builder for one pipeline step
pub type GroupFactory = Box<dyn Fn() -> Box<dyn FeatureBuilder> + Send + Sync>;

/// Maps configuration names to feature group constructors
#[derive(Default)]
pub struct GroupRegistry {
    factories: BTreeMap<String, GroupFactory>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `G` under `name`
    pub fn register<G>(&mut self, name: impl Into<String>) -> &mut Self
    where
        G: FeatureBuilder + Default + 'static,
    {
        self.register_with(name, || Box::new(G::default()))
    }

    /// Register a custom constructor under `name`
    pub fn register_with<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn FeatureBuilder> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn FeatureBuilder>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Run every step of `config` against `seed`
    ///
    /// All step names are checked before anything is built. `force_reload`,
    /// when given, replaces the configured pipeline-wide default.
    pub fn run(
        &self,
        config: &PipelineConfig,
        seed: Table,
        force_reload: Option<bool>,
    ) -> Result<Pipeline, FeatureError> {
        let unknown: Vec<&str> = config
            .steps
            .iter()
            .map(|step| step.group.as_str())
            .filter(|name| !self.contains(name))
            .collect();
        if !unknown.is_empty() {
            return Err(FeatureError::Configuration(format!(
                "unknown feature group(s): {} (registered: {})",
                unknown.join(", "),
                self.names().collect::<Vec<_>>().join(", ")
            )));
        }

        let merge_on = crate::core::MergeKey::new(config.merge_on.iter().cloned())?;
        let mut pipeline = Pipeline::new(seed, merge_on, config.data_dir())?
            .with_backend(config.backend())
            .with_force_reload(force_reload.unwrap_or(config.force_reload));

        for step in &config.steps {
            let builder = self.create(&step.group).ok_or_else(|| {
                FeatureError::Configuration(format!("unknown feature group: {}", step.group))
            })?;
            info!("Piping feature group '{}'", step.group);
            // An explicit override also beats per-step settings.
            let step_reload = force_reload.or(step.force_reload);
            pipeline.pipe_builder(builder, step.params(), step_reload)?;
        }

        Ok(pipeline)
    }
}
