//! Compute-or-load decision for one feature group

use crate::core::{FeatureError, Table};
use crate::persistence::{CacheLocation, StorageBackend};
use std::sync::Arc;
use tracing::{debug, info};

/// How the last `resolve` produced its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The build step ran and its result was persisted
    Built,
    /// The persisted entry was read from storage
    Loaded,
    /// The entry exists and this instance already held it in memory
    Memory,
}

/// Cache policy for a single feature group
///
/// An existing entry is authoritative: its content is returned no matter
/// which parameters produced it. Only `force_reload` or deleting the entry
/// leads to a rebuild.
pub struct FeatureCache {
    group: String,
    backend: Arc<dyn StorageBackend>,
    memo: Option<(CacheLocation, Table)>,
    last_outcome: Option<CacheOutcome>,
}

impl FeatureCache {
    pub fn new(group: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            group: group.into(),
            backend,
            memo: None,
            last_outcome: None,
        }
    }

    pub fn last_outcome(&self) -> Option<CacheOutcome> {
        self.last_outcome
    }

    /// Return the entry at `location`, building and persisting it when absent
    /// or when `force_reload` is set
    ///
    /// A failing `build` writes nothing. A failing load is returned as is;
    /// there is no fallback to rebuilding.
    pub fn resolve<F>(
        &mut self,
        build: F,
        location: &CacheLocation,
        force_reload: bool,
    ) -> Result<Table, FeatureError>
    where
        F: FnOnce() -> Result<Table, FeatureError>,
    {
        debug!(group = %self.group, %location, force_reload, "Resolving feature cache");

        if !force_reload && self.backend.exists(location)? {
            if let Some((memo_location, table)) = &self.memo {
                if memo_location == location {
                    info!("{}: Using in-memory features.", self.group);
                    self.last_outcome = Some(CacheOutcome::Memory);
                    return Ok(table.clone());
                }
            }

            let table = self.backend.load(location)?;
            info!("{}: Loaded from disk.", self.group);
            self.remember(location, &table, CacheOutcome::Loaded);
            return Ok(table);
        }

        let table = build()?;
        self.backend.save(&table, location)?;
        info!("{}: Features have been calculated.", self.group);
        self.remember(location, &table, CacheOutcome::Built);
        Ok(table)
    }

    fn remember(&mut self, location: &CacheLocation, table: &Table, outcome: CacheOutcome) {
        self.memo = Some((location.clone(), table.clone()));
        self.last_outcome = Some(outcome);
    }
}
