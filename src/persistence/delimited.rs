//! Delimited-text (CSV/TSV) storage backend
//!
//! Cache entries carry two header records: column names, then one type tag
//! per column (`int`, `float`, `bool`, `str`, `null` or `any`). Cells of a
//! tagged column are plain text and an empty field is `Null`. A column whose
//! values mix types, or a `str` column holding empty strings, is tagged `any`
//! and each cell carries its own `i:`, `f:`, `b:` or `s:` marker. Loading an
//! entry therefore gives back exactly the table that was saved.
//!
//! [`DelimitedTextBackend::import`] and [`DelimitedTextBackend::export`] read
//! and write plain files without the type row, for seed tables and results
//! exchanged with other tools. Imported cells are re-typed with
//! [`Value::parse_field`].

use crate::core::{Column, Table, Value};
use crate::persistence::{
    file_exists, remove_file_entry, write_atomically, CacheLocation, StorageBackend, StorageError,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Flat-file backend using the `csv` crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedTextBackend {
    delimiter: u8,
    extension: &'static str,
}

/// How the cells of one column are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Any,
}

impl ColumnType {
    fn of(column: &Column) -> Self {
        let mut found: Option<ColumnType> = None;
        for value in &column.values {
            let kind = match value {
                Value::Null => continue,
                Value::Bool(_) => ColumnType::Bool,
                Value::Int(_) => ColumnType::Int,
                Value::Float(_) => ColumnType::Float,
                // An empty string would read back as Null in a `str` column.
                Value::Str(s) if s.is_empty() => return ColumnType::Any,
                Value::Str(_) => ColumnType::Str,
            };
            match found {
                None => found = Some(kind),
                Some(existing) if existing != kind => return ColumnType::Any,
                Some(_) => {}
            }
        }
        found.unwrap_or(ColumnType::Null)
    }

    fn tag(self) -> &'static str {
        match self {
            ColumnType::Null => "null",
            ColumnType::Bool => "bool",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Str => "str",
            ColumnType::Any => "any",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "null" => ColumnType::Null,
            "bool" => ColumnType::Bool,
            "int" => ColumnType::Int,
            "float" => ColumnType::Float,
            "str" => ColumnType::Str,
            "any" => ColumnType::Any,
            _ => return None,
        })
    }

    fn encode(self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Null) => String::new(),
            (ColumnType::Any, Value::Bool(b)) => format!("b:{}", b),
            (ColumnType::Any, Value::Int(i)) => format!("i:{}", i),
            (ColumnType::Any, Value::Float(f)) => format!("f:{:?}", f),
            (ColumnType::Any, Value::Str(s)) => format!("s:{}", s),
            (_, value) => value.to_field(),
        }
    }

    fn decode(self, field: &str) -> Option<Value> {
        if field.is_empty() {
            return Some(Value::Null);
        }
        match self {
            ColumnType::Null => None,
            ColumnType::Bool => field.parse().ok().map(Value::Bool),
            ColumnType::Int => field.parse().ok().map(Value::Int),
            ColumnType::Float => field.parse().ok().map(Value::Float),
            ColumnType::Str => Some(Value::Str(field.to_string())),
            ColumnType::Any => {
                let (marker, rest) = field.split_once(':')?;
                match marker {
                    "b" => ColumnType::Bool.decode(rest),
                    "i" => ColumnType::Int.decode(rest),
                    "f" => ColumnType::Float.decode(rest),
                    "s" => Some(Value::Str(rest.to_string())),
                    _ => None,
                }
            }
        }
    }
}

impl DelimitedTextBackend {
    /// Comma-separated, `.csv`
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            extension: "csv",
        }
    }

    /// Tab-separated, `.tsv`
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            extension: "tsv",
        }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn csv_error(location: &CacheLocation, source: csv::Error) -> StorageError {
        StorageError::Csv {
            location: location.to_string(),
            source,
        }
    }

    fn malformed(location: &CacheLocation, reason: impl Into<String>) -> StorageError {
        StorageError::Malformed {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    fn open(&self, location: &CacheLocation) -> Result<csv::Reader<File>, StorageError> {
        let file = File::open(location.path()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(location.to_string()),
            _ => StorageError::io(location, e),
        })?;

        Ok(csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(file))
    }

    /// Read a cache entry written by [`DelimitedTextBackend::write_table`]
    pub fn read_table(&self, location: &CacheLocation) -> Result<Table, StorageError> {
        let mut reader = self.open(location)?;
        let headers = reader
            .headers()
            .map_err(|e| Self::csv_error(location, e))?
            .clone();

        // A table without columns is written as a single empty header field.
        if headers.len() == 1 && headers.get(0) == Some("") {
            return Ok(Table::new());
        }

        let mut records = reader.records();
        let tags = records
            .next()
            .ok_or_else(|| Self::malformed(location, "missing column type row"))?
            .map_err(|e| Self::csv_error(location, e))?;
        let types = tags
            .iter()
            .map(|tag| {
                ColumnType::from_tag(tag)
                    .ok_or_else(|| Self::malformed(location, format!("unknown column type '{}'", tag)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut values: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for (line, record) in records.enumerate() {
            let record = record.map_err(|e| Self::csv_error(location, e))?;
            for ((column, field), (name, kind)) in values
                .iter_mut()
                .zip(record.iter())
                .zip(headers.iter().zip(&types))
            {
                let value = kind.decode(field).ok_or_else(|| {
                    Self::malformed(
                        location,
                        format!(
                            "row {}: '{}' is not a valid {} value for column '{}'",
                            line + 1,
                            field,
                            kind.tag(),
                            name
                        ),
                    )
                })?;
                column.push(value);
            }
        }

        Self::assemble(location, &headers, values)
    }

    /// Read a plain delimited file (header plus data), inferring cell types
    pub fn import(&self, location: &CacheLocation) -> Result<Table, StorageError> {
        let mut reader = self.open(location)?;
        let headers = reader
            .headers()
            .map_err(|e| Self::csv_error(location, e))?
            .clone();

        if headers.len() == 1 && headers.get(0) == Some("") {
            return Ok(Table::new());
        }

        let mut values: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|e| Self::csv_error(location, e))?;
            for (column, field) in values.iter_mut().zip(record.iter()) {
                column.push(Value::parse_field(field));
            }
        }

        Self::assemble(location, &headers, values)
    }

    fn assemble(
        location: &CacheLocation,
        headers: &csv::StringRecord,
        values: Vec<Vec<Value>>,
    ) -> Result<Table, StorageError> {
        let columns = headers
            .iter()
            .zip(values)
            .map(|(name, values)| Column {
                name: name.to_string(),
                values,
            })
            .collect();

        Table::from_columns(columns).map_err(|e| Self::malformed(location, e.to_string()))
    }

    /// Write a table as a typed cache entry (not atomic on its own)
    pub fn write_table<W: std::io::Write>(
        &self,
        table: &Table,
        writer: W,
        location: &CacheLocation,
    ) -> Result<(), StorageError> {
        self.write_records(table, writer, location, true)
    }

    /// Write a plain delimited file without the type row
    pub fn export(&self, table: &Table, location: &CacheLocation) -> Result<(), StorageError> {
        write_atomically(location, |file| {
            self.write_records(table, BufWriter::new(file), location, false)
        })
    }

    fn write_records<W: std::io::Write>(
        &self,
        table: &Table,
        writer: W,
        location: &CacheLocation,
        typed: bool,
    ) -> Result<(), StorageError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        writer
            .write_record(table.column_names())
            .map_err(|e| Self::csv_error(location, e))?;

        let types: Vec<ColumnType> = if typed {
            table.columns().iter().map(ColumnType::of).collect()
        } else {
            vec![ColumnType::Str; table.num_columns()]
        };
        if typed && !types.is_empty() {
            writer
                .write_record(types.iter().map(|t| t.tag()))
                .map_err(|e| Self::csv_error(location, e))?;
        }

        for row in 0..table.num_rows() {
            writer
                .write_record(
                    table
                        .columns()
                        .iter()
                        .zip(&types)
                        .map(|(c, t)| t.encode(&c.values[row])),
                )
                .map_err(|e| Self::csv_error(location, e))?;
        }

        writer.flush().map_err(|e| StorageError::io(location, e))
    }
}

impl Default for DelimitedTextBackend {
    fn default() -> Self {
        Self::csv()
    }
}

impl StorageBackend for DelimitedTextBackend {
    fn location(&self, data_dir: &Path, group_name: &str) -> CacheLocation {
        CacheLocation::for_group(data_dir, group_name, self.extension)
    }

    fn exists(&self, location: &CacheLocation) -> Result<bool, StorageError> {
        file_exists(location)
    }

    fn save(&self, table: &Table, location: &CacheLocation) -> Result<(), StorageError> {
        write_atomically(location, |file| {
            self.write_table(table, BufWriter::new(file), location)
        })
    }

    fn load(&self, location: &CacheLocation) -> Result<Table, StorageError> {
        self.read_table(location)
    }

    fn remove(&self, location: &CacheLocation) -> Result<bool, StorageError> {
        remove_file_entry(location)
    }
}
