//! SQLite storage implementation
//!
//! This module provides the SQLite-backed [`ReplaceSet`] table and the
//! database handle that hands out scoped connections.

use crate::scrape::Record;
use crate::storage::schema::TableSpec;
use crate::storage::traits::{ReplaceOutcome, ReplaceSet, StorageError, StorageResult};
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Handle to a SQLite database file
///
/// Holds no connection itself; each sync step calls [`Database::open`] and
/// the connection is closed when the returned value is dropped.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a new connection to the database file, creating it if needed
    ///
    /// Every failure here is reported as [`StorageError::Connection`].
    pub fn open(&self) -> StorageResult<Connection> {
        self.try_open().map_err(|message| StorageError::Connection {
            path: self.path.display().to_string(),
            message,
        })
    }

    fn try_open(&self) -> Result<Connection, String> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
        }

        let conn = Connection::open(&self.path).map_err(|e| e.to_string())?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| e.to_string())?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(|e| e.to_string())?;

        Ok(conn)
    }
}

/// One replace-set table over a borrowed connection
pub struct SqliteTable<'c> {
    conn: &'c mut Connection,
    spec: &'static TableSpec,
}

impl<'c> SqliteTable<'c> {
    /// Binds `spec` to `conn`, creating the table if it does not exist
    pub fn open(conn: &'c mut Connection, spec: &'static TableSpec) -> StorageResult<Self> {
        let table = Self { conn, spec };
        table.ensure_schema()?;
        Ok(table)
    }

    pub fn spec(&self) -> &'static TableSpec {
        self.spec
    }

    /// Counts all rows in the table
    pub fn count_rows(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.spec.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Most recent store-assigned `CreatedAt`, if the table has that column
    pub fn latest_created_at(&self) -> StorageResult<Option<String>> {
        if !self.spec.has_created_at() {
            return Ok(None);
        }

        let latest: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT MAX(CreatedAt) FROM {}", self.spec.name),
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();

        Ok(latest)
    }

    /// Rejects key columns the table does not have; keys are spliced into SQL
    fn check_column(&self, column: &str) -> StorageResult<()> {
        if self.spec.has_column(column) {
            Ok(())
        } else {
            Err(StorageError::UnknownColumn {
                table: self.spec.name.to_string(),
                column: column.to_string(),
            })
        }
    }

    /// Runs `delete` then inserts `rows` inside one transaction
    ///
    /// Any error drops the transaction, which rolls it back.
    fn replace_with<F>(&mut self, rows: &[Record], delete: F) -> StorageResult<ReplaceOutcome>
    where
        F: FnOnce(&Transaction<'_>) -> StorageResult<usize>,
    {
        let spec = self.spec;
        let tx = self.conn.transaction()?;

        let deleted = delete(&tx)?;
        let inserted = insert_rows(&tx, spec, rows)?;

        tx.commit()?;
        Ok(ReplaceOutcome { deleted, inserted })
    }
}

impl ReplaceSet for SqliteTable<'_> {
    fn ensure_schema(&self) -> StorageResult<()> {
        self.conn.execute_batch(&self.spec.create_sql())?;
        Ok(())
    }

    fn read_all(&self) -> StorageResult<Vec<Record>> {
        let columns = self.spec.columns;
        let mut stmt = self.conn.prepare(&self.spec.select_sql())?;

        let rows = stmt
            .query_map([], |row| {
                let mut record = Record::new();
                for (index, column) in columns.iter().enumerate() {
                    if let Some(value) = value_to_string(row.get_ref(index)?) {
                        record.insert(column.name.to_string(), value);
                    }
                }
                Ok(record)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn replace_all(&mut self, rows: &[Record]) -> StorageResult<ReplaceOutcome> {
        let table = self.spec.name;
        self.replace_with(rows, |tx| {
            Ok(tx.execute(&format!("DELETE FROM {}", table), [])?)
        })
    }

    fn replace_by_key(
        &mut self,
        key: &str,
        key_value: &str,
        rows: &[Record],
    ) -> StorageResult<ReplaceOutcome> {
        self.check_column(key)?;
        let sql = format!("DELETE FROM {} WHERE {} = ?1", self.spec.name, key);
        self.replace_with(rows, |tx| Ok(tx.execute(&sql, params![key_value])?))
    }

    fn replace_by_keys(
        &mut self,
        key: &str,
        key_values: &[String],
        rows: &[Record],
    ) -> StorageResult<ReplaceOutcome> {
        self.check_column(key)?;
        let sql = format!("DELETE FROM {} WHERE {} = ?1", self.spec.name, key);
        self.replace_with(rows, |tx| {
            let mut stmt = tx.prepare(&sql)?;
            let mut deleted = 0;
            for value in key_values {
                deleted += stmt.execute(params![value])?;
            }
            Ok(deleted)
        })
    }
}

/// Inserts `rows` positionally over the table's insertable columns
fn insert_rows(tx: &Transaction<'_>, spec: &TableSpec, rows: &[Record]) -> StorageResult<usize> {
    let columns: Vec<&str> = spec.insert_columns().map(|c| c.name).collect();
    let mut stmt = tx.prepare(&spec.insert_sql())?;
    let mut inserted = 0;

    for (index, row) in rows.iter().enumerate() {
        let values = columns
            .iter()
            .map(|column| {
                row.get(*column)
                    .map(String::as_str)
                    .ok_or_else(|| StorageError::MissingField {
                        table: spec.name.to_string(),
                        column: column.to_string(),
                        row: index,
                    })
            })
            .collect::<StorageResult<Vec<&str>>>()?;

        inserted += stmt.execute(params_from_iter(values))?;
    }

    Ok(inserted)
}

/// Renders a stored value as text; NULL becomes an absent field
fn value_to_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}
