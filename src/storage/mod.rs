//! Storage module for persisting scraped rows
//!
//! This module handles all database operations of a sync run, including:
//! - SQLite database opening and schema creation
//! - Atomic whole-table and per-key replaces
//! - Reading stored rows back in insertion order

mod schema;
mod sqlite;
mod traits;

pub use schema::{
    ColumnDef, TableSpec, CATALOG_PRODUCTS_TABLE, COMPANIES_TABLE, CUSTOMERS_TABLE,
    STOCK_PRODUCTS_TABLE,
};
pub use sqlite::{Database, SqliteTable};
pub use traits::{ReplaceOutcome, ReplaceSet, StorageError, StorageResult};
