//! Data source abstraction and metadata.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CuratorError, Result};

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// Column holding the entity key.
    pub key_column: String,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(path: PathBuf, hash: String, size_bytes: u64, format: String, table: &DataTable) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count: table.row_count(),
            column_count: table.column_count(),
            key_column: table.key_column().to_string(),
            loaded_at: Utc::now(),
        }
    }
}

/// A tabular snapshot: one row per entity, one column per property.
#[derive(Debug, Clone)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// The delimiter used.
    pub delimiter: u8,
    key_index: usize,
    key_rows: HashMap<String, usize>,
}

impl DataTable {
    /// Create a table keyed by its first column.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8) -> Self {
        let mut table = Self {
            headers,
            rows,
            delimiter,
            key_index: 0,
            key_rows: HashMap::new(),
        };
        table.index_keys();
        table
    }

    /// Key the table by the named column.
    pub fn with_key_column(mut self, column: &str) -> Result<Self> {
        self.key_index = self
            .column_index(column)
            .ok_or_else(|| CuratorError::UnknownColumn(column.to_string()))?;
        self.index_keys();
        Ok(self)
    }

    fn index_keys(&mut self) {
        self.key_rows.clear();
        for (row_idx, row) in self.rows.iter().enumerate() {
            let key = row.get(self.key_index).map(String::as_str).unwrap_or("");
            if self.key_rows.contains_key(key) {
                tracing::warn!(key, row = row_idx + 1, "Duplicate entity key, keeping first row");
                continue;
            }
            self.key_rows.insert(key.to_string(), row_idx);
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Name of the entity key column.
    pub fn key_column(&self) -> &str {
        self.headers.get(self.key_index).map(String::as_str).unwrap_or("")
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.column_values(index).collect())
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Replace a cell value. Returns the previous value.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) -> Option<String> {
        let cell = self.rows.get_mut(row)?.get_mut(col)?;
        Some(std::mem::replace(cell, value.into()))
    }

    /// Entity key of a row.
    pub fn entity_key(&self, row: usize) -> Option<&str> {
        self.get(row, self.key_index)
    }

    /// Row carrying the given entity key.
    pub fn row_for_key(&self, key: &str) -> Option<usize> {
        self.key_rows.get(key).copied()
    }

    /// Write the table in its own delimiter.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);
        out.write_record(&self.headers)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush().map_err(|e| CuratorError::Csv(e.into()))?;
        Ok(())
    }

    /// Write the table to a file, creating parent directories.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_error = |e: std::io::Error| CuratorError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = File::create(path).map_err(io_error)?;
        self.write_to(file)
    }
}
