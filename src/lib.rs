//! Catalog-Sync: scheduled listing scrapes mirrored into SQLite
//!
//! This crate pulls HTML listing pages, extracts their table rows and
//! synchronizes them into a local SQLite store using atomic delete-then-insert
//! replaces, either for a whole table or for the rows sharing one key.

pub mod config;
pub mod output;
pub mod scrape;
pub mod storage;
pub mod sync;
pub mod workflow;

use thiserror::Error;

/// Main error type for Catalog-Sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Record for '{key}' has no '{field}' field")]
    MissingKeyField { key: String, field: String },

    #[error("Invalid run phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: sync::RunPhase,
        to: sync::RunPhase,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl SyncError {
    /// True for errors that must abort the whole run rather than one key
    ///
    /// Failing to acquire a storage connection means no later key can be
    /// persisted either.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::Storage(storage::StorageError::Connection { .. }))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Workflow '{0}' is not configured")]
    MissingWorkflow(String),
}

/// Page fetch failures
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

/// Markup that does not match the expected table shape
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No table element found")]
    MissingTable,

    #[error("Row {row} has {found} cells, expected at least {expected}")]
    MissingColumns {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} has no link for field '{field}'")]
    MissingLink { row: usize, field: &'static str },

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(&'static str),
}

/// Result type alias for Catalog-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use scrape::{EntityKind, PageFetcher, Record};
pub use storage::{ReplaceOutcome, ReplaceSet};
pub use sync::{RunContext, SyncReport};
pub use workflow::{run_workflow, Workflow};
