//! Storage traits and error types
//!
//! This module defines the replace-set interface every table backend offers
//! and the associated error types.

use crate::scrape::Record;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("Row {row} for table '{table}' is missing field '{column}'")]
    MissingField {
        table: String,
        column: String,
        row: usize,
    },

    #[error("Failed to open database '{path}': {message}")]
    Connection { path: String, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Row counts of a successful replace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub deleted: usize,
    pub inserted: usize,
}

/// A table whose contents are only ever replaced, never updated in place
///
/// Every `replace_*` call is atomic: the delete and the insert either both
/// take effect or neither does, and on failure the original error is returned
/// with the table left as it was before the call.
pub trait ReplaceSet {
    /// Creates the table if it does not exist; never touches data
    fn ensure_schema(&self) -> StorageResult<()>;

    /// Returns every row in insertion order
    fn read_all(&self) -> StorageResult<Vec<Record>>;

    /// Deletes every row, then inserts `rows`
    fn replace_all(&mut self, rows: &[Record]) -> StorageResult<ReplaceOutcome>;

    /// Deletes the rows whose `key` column equals `key_value`, then inserts `rows`
    ///
    /// The caller is expected to pass rows sharing `key_value`; this is not checked.
    fn replace_by_key(
        &mut self,
        key: &str,
        key_value: &str,
        rows: &[Record],
    ) -> StorageResult<ReplaceOutcome>;

    /// Deletes the rows matching any of `key_values`, then inserts `rows`
    fn replace_by_keys(
        &mut self,
        key: &str,
        key_values: &[String],
        rows: &[Record],
    ) -> StorageResult<ReplaceOutcome>;
}
