//! JSON storage backend
//!
//! Stores a table as an array of `{name, values}` columns, readable by any
//! JSON tool. Non-finite floats are the exception to exact round trips:
//! JSON has no representation for them and they read back as missing.

use crate::core::Table;
use crate::persistence::{
    file_exists, remove_file_entry, write_atomically, CacheLocation, StorageBackend, StorageError,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Type-preserving backend using `serde_json`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonBackend;

impl JsonBackend {
    pub fn new() -> Self {
        Self
    }

    fn json_error(location: &CacheLocation, source: serde_json::Error) -> StorageError {
        StorageError::Json {
            location: location.to_string(),
            source,
        }
    }
}

impl StorageBackend for JsonBackend {
    fn location(&self, data_dir: &Path, group_name: &str) -> CacheLocation {
        CacheLocation::for_group(data_dir, group_name, "json")
    }

    fn exists(&self, location: &CacheLocation) -> Result<bool, StorageError> {
        file_exists(location)
    }

    fn save(&self, table: &Table, location: &CacheLocation) -> Result<(), StorageError> {
        write_atomically(location, |file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, table).map_err(|e| Self::json_error(location, e))?;
            writer.flush().map_err(|e| StorageError::io(location, e))
        })
    }

    fn load(&self, location: &CacheLocation) -> Result<Table, StorageError> {
        let file = File::open(location.path()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(location.to_string()),
            _ => StorageError::io(location, e),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Self::json_error(location, e))
    }

    fn remove(&self, location: &CacheLocation) -> Result<bool, StorageError> {
        remove_file_entry(location)
    }
}
