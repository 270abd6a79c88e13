//! Pipeline: sequential feature-group composition

use crate::core::{FeatureError, MergeKey, Params, Table};
use crate::execution::group::{FeatureBuilder, FeatureGroup, GroupSettings};
use crate::execution::merge::left_merge;
use crate::persistence::{DelimitedTextBackend, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span};
use uuid::Uuid;

/// Accumulates the features of successive groups into one table
///
/// Every group is built from the seed table, not from the accumulated one,
/// and merged on the same key. Groups run strictly in `pipe` order.
pub struct Pipeline {
    /// Identifies this pipeline in logs
    run_id: Uuid,

    seed: Table,

    output: Table,

    merge_on: MergeKey,

    data_dir: PathBuf,

    backend: Arc<dyn StorageBackend>,

    /// Default for `pipe` calls that don't override it
    force_reload: bool,

    /// Names of groups merged so far, in order
    piped: Vec<String>,
}

impl Pipeline {
    /// Create a pipeline over `seed`, caching under `data_dir`
    ///
    /// Fails if `seed` lacks any merge-key column.
    pub fn new(
        seed: Table,
        merge_on: MergeKey,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, FeatureError> {
        let missing = merge_on.missing_from(&seed);
        if !missing.is_empty() {
            return Err(FeatureError::Configuration(format!(
                "seed table is missing merge-key column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            run_id: Uuid::new_v4(),
            output: seed.clone(),
            seed,
            merge_on,
            data_dir: data_dir.into(),
            backend: Arc::new(DelimitedTextBackend::default()),
            force_reload: false,
            piped: Vec::new(),
        })
    }

    /// Use `backend` for every group piped from now on
    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_force_reload(mut self, force_reload: bool) -> Self {
        self.force_reload = force_reload;
        self
    }

    /// Change the force-reload default for later `pipe` calls
    pub fn set_force_reload(&mut self, force_reload: bool) -> &mut Self {
        self.force_reload = force_reload;
        self
    }

    /// Resolve group `G` and merge its features
    pub fn pipe<G: FeatureBuilder + Default>(&mut self, params: Params) -> Result<&mut Self, FeatureError> {
        self.pipe_builder(G::default(), params, None)
    }

    /// Like [`Pipeline::pipe`], optionally overriding the force-reload default
    pub fn pipe_with<G: FeatureBuilder + Default>(
        &mut self,
        params: Params,
        force_reload: Option<bool>,
    ) -> Result<&mut Self, FeatureError> {
        self.pipe_builder(G::default(), params, force_reload)
    }

    /// Resolve an already constructed builder and merge its features
    ///
    /// On error the accumulated table is left as it was.
    pub fn pipe_builder<B: FeatureBuilder>(
        &mut self,
        builder: B,
        params: Params,
        force_reload: Option<bool>,
    ) -> Result<&mut Self, FeatureError> {
        let span = info_span!("pipeline", run_id = %self.run_id);
        let _enter = span.enter();

        let settings = GroupSettings {
            data_dir: self.data_dir.clone(),
            merge_on: self.merge_on.clone(),
            force_reload: force_reload.unwrap_or(self.force_reload),
            backend: self.backend.clone(),
        };
        let mut group = FeatureGroup::new(builder, settings)?;

        if self.piped.iter().any(|name| name == group.name()) {
            return Err(FeatureError::Configuration(format!(
                "feature group '{}' was already piped",
                group.name()
            )));
        }

        let features = group.resolve(&self.seed, &params)?;
        let merged = left_merge(&self.output, &features, &self.merge_on)?;
        debug!(
            group = group.name(),
            rows = merged.num_rows(),
            columns = merged.num_columns(),
            "Merged features"
        );

        self.output = merged;
        self.piped.push(group.name().to_string());
        Ok(self)
    }

    /// Current accumulated table (the seed table before any `pipe`)
    pub fn features_df(&self) -> &Table {
        &self.output
    }

    pub fn into_features_df(self) -> Table {
        self.output
    }

    /// Drop all merged features and restore the default force-reload flag
    pub fn reset(&mut self) -> &mut Self {
        info!(run_id = %self.run_id, "Resetting pipeline to seed table");
        self.output = self.seed.clone();
        self.piped.clear();
        self.force_reload = false;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn seed(&self) -> &Table {
        &self.seed
    }

    pub fn merge_on(&self) -> &MergeKey {
        &self.merge_on
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn force_reload(&self) -> bool {
        self.force_reload
    }

    pub fn piped_groups(&self) -> &[String] {
        &self.piped
    }
}
