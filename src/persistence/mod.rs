//! Storage backends for cached feature tables
//!
//! The cache and the pipeline only ever talk to [`StorageBackend`]; where a
//! table lands and how it is encoded is the backend's business.

pub mod delimited;
pub mod json;

pub use delimited::DelimitedTextBackend;
pub use json::JsonBackend;

use crate::core::Table;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};
use thiserror::Error;

/// Suffix appended to a group name to form its cache entry name
pub const CACHE_SUFFIX: &str = "_features_cache";

/// Error types for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed delimited text at {location}: {source}")]
    Csv {
        location: String,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed JSON at {location}: {source}")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed cache entry at {location}: {reason}")]
    Malformed { location: String, reason: String },

    #[error("No cache entry at {0}")]
    NotFound(String),
}

impl StorageError {
    pub(crate) fn io(location: &CacheLocation, source: std::io::Error) -> Self {
        StorageError::Io {
            location: location.to_string(),
            source,
        }
    }
}

/// Address of one cached table
///
/// Derived from a data directory and a group name. Callers treat it as an
/// opaque handle; file backends interpret it as a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheLocation(PathBuf);

impl CacheLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// `<data_dir>/<group>_features_cache.<extension>`
    pub fn for_group(data_dir: &Path, group_name: &str, extension: &str) -> Self {
        Self(data_dir.join(format!(
            "{}{}.{}",
            sanitize_group_name(group_name),
            CACHE_SUFFIX,
            extension
        )))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CacheLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Replace characters that are unsafe in file names
pub fn sanitize_group_name(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9_.-]+").expect("static regex is valid")
    });
    unsafe_chars.replace_all(name, "_").into_owned()
}

/// Trait for storage backends
pub trait StorageBackend: Send + Sync {
    /// Cache location for a group inside `data_dir`
    fn location(&self, data_dir: &Path, group_name: &str) -> CacheLocation;

    /// Whether an entry is present at `location`
    ///
    /// A failure to find out is an error, never a plain `false`, so the
    /// cache does not rebuild over an entry it merely could not see.
    fn exists(&self, location: &CacheLocation) -> Result<bool, StorageError>;

    /// Persist `table`, replacing any previous entry
    fn save(&self, table: &Table, location: &CacheLocation) -> Result<(), StorageError>;

    /// Read the entry at `location`
    fn load(&self, location: &CacheLocation) -> Result<Table, StorageError>;

    /// Delete the entry at `location`; returns whether one existed
    fn remove(&self, location: &CacheLocation) -> Result<bool, StorageError>;
}

/// Write a file through a sibling temp file and an atomic rename
///
/// If `write` fails the temp file is removed and any existing entry is left
/// as it was.
pub(crate) fn write_atomically<F>(location: &CacheLocation, write: F) -> Result<(), StorageError>
where
    F: FnOnce(File) -> Result<(), StorageError>,
{
    let path = location.path();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::io(location, e))?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let file = File::create(&tmp_path).map_err(|e| StorageError::io(location, e))?;
    if let Err(e) = write(file) {
        std::fs::remove_file(&tmp_path).ok();
        return Err(e);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        std::fs::remove_file(&tmp_path).ok();
        StorageError::io(location, e)
    })
}

/// Whether a file-backed entry is present
pub(crate) fn file_exists(location: &CacheLocation) -> Result<bool, StorageError> {
    match std::fs::metadata(location.path()) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::io(location, e)),
    }
}

/// Remove a file-backed entry
pub(crate) fn remove_file_entry(location: &CacheLocation) -> Result<bool, StorageError> {
    match std::fs::remove_file(location.path()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::io(location, e)),
    }
}

/// A cache file found on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryInfo {
    /// Group name recovered from the file name
    pub group: String,

    pub path: PathBuf,

    pub size_bytes: u64,

    pub modified: Option<DateTime<Utc>>,
}

/// List cache files in `data_dir`, sorted by group name
///
/// A missing directory simply has no entries.
pub fn list_entries(data_dir: &Path) -> Result<Vec<CacheEntryInfo>, StorageError> {
    let dir_location = CacheLocation::new(data_dir);
    let read_dir = match std::fs::read_dir(data_dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(&dir_location, e)),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| StorageError::io(&dir_location, e))?;
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(group) = stem.strip_suffix(CACHE_SUFFIX) else {
            continue;
        };
        let metadata = entry.metadata().map_err(|e| StorageError::io(&dir_location, e))?;
        if !metadata.is_file() {
            continue;
        }

        entries.push(CacheEntryInfo {
            group: group.to_string(),
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            path,
        });
    }

    entries.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.path.cmp(&b.path)));
    Ok(entries)
}

/// In-memory storage (for testing or ephemeral use)
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<CacheLocation, Table>>,
    saves: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of stored entries
    ///
    /// Counting only reads the map, and every write is a single insert or
    /// remove, so a lock poisoned by a panicking writer still guards a
    /// consistent map and is read through.
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(location: &CacheLocation) -> StorageError {
        StorageError::Malformed {
            location: location.to_string(),
            reason: "in-memory store lock poisoned".to_string(),
        }
    }
}

impl StorageBackend for InMemoryBackend {
    fn location(&self, data_dir: &Path, group_name: &str) -> CacheLocation {
        CacheLocation::for_group(data_dir, group_name, "mem")
    }

    fn exists(&self, location: &CacheLocation) -> Result<bool, StorageError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned(location))?;
        Ok(tables.contains_key(location))
    }

    fn save(&self, table: &Table, location: &CacheLocation) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned(location))?;
        tables.insert(location.clone(), table.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self, location: &CacheLocation) -> Result<Table, StorageError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned(location))?;
        tables
            .get(location)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }

    fn remove(&self, location: &CacheLocation) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned(location))?;
        Ok(tables.remove(location).is_some())
    }
}
