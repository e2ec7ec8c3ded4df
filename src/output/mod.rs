//! Output module for run summaries and store statistics
//!
//! This module handles:
//! - Rendering the report of a finished synchronization run
//! - Loading and printing per-table statistics of a workflow database

mod report;
pub mod stats;

pub use report::{format_report, print_report};
pub use stats::{
    format_statistics, load_statistics, print_statistics, DatabaseStatistics, TableStatistics,
};
