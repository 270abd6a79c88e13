//! Feature groups: one computation, one cache, one naming convention

use crate::core::{FeatureError, MergeKey, Params, Table};
use crate::execution::cache::{CacheOutcome, FeatureCache};
use crate::persistence::{CacheLocation, DelimitedTextBackend, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

/// A unit of feature computation supplied by the user
///
/// Implementors provide a column prefix and the build step. The group's
/// identity, which also addresses its cache entry, defaults to the
/// unqualified type name.
pub trait FeatureBuilder {
    /// Prefix for every non-key output column (`<prefix>_<column>`)
    fn prefix(&self) -> &str;

    /// Compute features from `seed`
    ///
    /// The returned table must contain every `merge_on` column with values
    /// drawn from the seed's key columns. `params` is forwarded untouched
    /// from the `pipe` call.
    fn build_step(&self, seed: &Table, merge_on: &MergeKey, params: &Params) -> anyhow::Result<Table>;

    /// Identity of the group; keys its cache entry
    ///
    /// Parameters are not part of the identity: an entry built with one set
    /// of parameters is returned for any other set until it is reloaded.
    ///
    /// Neither is the module path. Two `Lengths` types from different modules
    /// share one entry, and so do names that only differ in characters unsafe
    /// for file names (`Rolling<7>` and `Rolling_7_` both become
    /// `Rolling_7_`). Nothing detects these collisions. Generic builders and
    /// same-named types should override this with a distinct name.
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }
}

impl<B: FeatureBuilder + ?Sized> FeatureBuilder for Box<B> {
    fn prefix(&self) -> &str {
        (**self).prefix()
    }

    fn build_step(&self, seed: &Table, merge_on: &MergeKey, params: &Params) -> anyhow::Result<Table> {
        (**self).build_step(seed, merge_on, params)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// `a::b::Lengths` -> `Lengths`, `a::Rolling<a::X>` -> `Rolling`
fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Settings every group is constructed with
#[derive(Clone)]
pub struct GroupSettings {
    /// Root for cache locations
    pub data_dir: PathBuf,

    pub merge_on: MergeKey,

    pub force_reload: bool,

    pub backend: Arc<dyn StorageBackend>,
}

impl GroupSettings {
    /// Settings with the delimited-text backend and no forced reload
    pub fn new(data_dir: impl Into<PathBuf>, merge_on: MergeKey) -> Self {
        Self {
            data_dir: data_dir.into(),
            merge_on,
            force_reload: false,
            backend: Arc::new(DelimitedTextBackend::default()),
        }
    }

    pub fn with_force_reload(mut self, force_reload: bool) -> Self {
        self.force_reload = force_reload;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = backend;
        self
    }
}

/// A builder bound to its cache policy
pub struct FeatureGroup<B> {
    builder: B,
    name: String,
    settings: GroupSettings,
    cache: FeatureCache,
}

impl<B: FeatureBuilder> FeatureGroup<B> {
    /// Bind `builder` to `settings`, validating its prefix and name
    pub fn new(builder: B, settings: GroupSettings) -> Result<Self, FeatureError> {
        let name = builder.name();
        if name.trim().is_empty() {
            return Err(FeatureError::Configuration(
                "feature group name must not be empty".to_string(),
            ));
        }
        validate_prefix(&name, builder.prefix())?;

        let cache = FeatureCache::new(name.clone(), settings.backend.clone());
        Ok(Self {
            builder,
            name,
            settings,
            cache,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        self.builder.prefix()
    }

    pub fn settings(&self) -> &GroupSettings {
        &self.settings
    }

    /// Where this group's table is cached
    pub fn location(&self) -> CacheLocation {
        self.settings
            .backend
            .location(&self.settings.data_dir, &self.name)
    }

    pub fn last_outcome(&self) -> Option<CacheOutcome> {
        self.cache.last_outcome()
    }

    /// Return this group's prefixed features, from cache when possible
    pub fn resolve(&mut self, seed: &Table, params: &Params) -> Result<Table, FeatureError> {
        let location = self.location();
        let builder = &self.builder;
        let name = self.name.as_str();
        let merge_on = &self.settings.merge_on;

        let build = || -> Result<Table, FeatureError> {
            let result = builder
                .build_step(seed, merge_on, params)
                .map_err(FeatureError::Build)?;
            check_output(name, merge_on, &result)?;
            prefix_columns(builder.prefix(), merge_on, &result)
        };

        self.cache.resolve(build, &location, self.settings.force_reload)
    }
}

fn validate_prefix(group: &str, prefix: &str) -> Result<(), FeatureError> {
    if prefix.is_empty() {
        return Err(FeatureError::Configuration(format!(
            "feature group '{}' has an empty prefix",
            group
        )));
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(FeatureError::Configuration(format!(
            "feature group '{}' prefix '{}' contains whitespace",
            group, prefix
        )));
    }
    Ok(())
}

fn check_output(group: &str, merge_on: &MergeKey, table: &Table) -> Result<(), FeatureError> {
    let missing = merge_on.missing_from(table);
    if !missing.is_empty() {
        return Err(FeatureError::InvalidOutput {
            group: group.to_string(),
            reason: format!("missing merge-key column(s): {}", missing.join(", ")),
        });
    }
    Ok(())
}

/// Rename non-key columns to `<prefix>_<column>`; key columns keep their names
pub fn prefix_columns(prefix: &str, merge_on: &MergeKey, table: &Table) -> Result<Table, FeatureError> {
    for name in table.column_names() {
        if merge_on.contains(name) {
            continue;
        }
        let renamed = format!("{}_{}", prefix, name);
        if merge_on.contains(&renamed) {
            return Err(FeatureError::Merge(format!(
                "prefixing column '{}' gives '{}', which is a merge-key column",
                name, renamed
            )));
        }
    }

    table
        .clone()
        .rename_columns(|name| {
            if merge_on.contains(name) {
                name.to_string()
            } else {
                format!("{}_{}", prefix, name)
            }
        })
        .map_err(|e| FeatureError::Merge(e.to_string()))
}
