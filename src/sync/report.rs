//! Outcome types of a synchronization run

use crate::storage::ReplaceOutcome;
use crate::sync::RunContext;
use crate::workflow::Workflow;
use crate::SyncError;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Step of a dependent sync at which a key failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    Fetch,
    Extract,
    Persist,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to one catalog key
#[derive(Debug)]
pub enum DependentStatus {
    /// Dependents were scraped and handed to storage
    ///
    /// `replaced` is `None` when the rows were collected for a later
    /// aggregated write instead of being replaced per key.
    Synced {
        records: usize,
        replaced: Option<ReplaceOutcome>,
    },

    /// The key was skipped; stored data for it is unchanged by this step
    Failed { stage: FailureStage, error: SyncError },
}

/// Per-key result of the dependents phase
#[derive(Debug)]
pub struct DependentOutcome {
    pub key: String,
    pub url: String,
    pub status: DependentStatus,
}

impl DependentOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, DependentStatus::Failed { .. })
    }
}

/// Result of the catalog phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOutcome {
    pub table: &'static str,
    pub scraped: usize,
    pub replaced: ReplaceOutcome,
}

/// Summary of a finished synchronization run
#[derive(Debug)]
pub struct SyncReport {
    pub workflow: Workflow,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub catalog: CatalogOutcome,
    /// Number of catalog keys read back from the store
    pub catalog_keys: usize,
    /// One entry per catalog key, in key order
    pub dependents: Vec<DependentOutcome>,
    /// Whole-table write of the unioned dependents, when the workflow does one
    pub aggregate: Option<ReplaceOutcome>,
}

impl SyncReport {
    /// Closes out the run described by `ctx`
    pub fn new(
        ctx: &RunContext,
        catalog: CatalogOutcome,
        catalog_keys: usize,
        dependents: Vec<DependentOutcome>,
        aggregate: Option<ReplaceOutcome>,
    ) -> Self {
        Self {
            workflow: ctx.workflow(),
            run_id: ctx.run_id(),
            started_at: ctx.started_at(),
            finished_at: Utc::now(),
            catalog,
            catalog_keys,
            dependents,
            aggregate,
        }
    }

    /// True when at least one catalog key failed
    pub fn has_failures(&self) -> bool {
        self.dependents.iter().any(DependentOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DependentOutcome> {
        self.dependents.iter().filter(|o| o.is_failure())
    }

    pub fn synced_count(&self) -> usize {
        self.dependents.len() - self.failed_count()
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Total dependent records scraped across synced keys
    pub fn dependent_records(&self) -> usize {
        self.dependents
            .iter()
            .map(|o| match o.status {
                DependentStatus::Synced { records, .. } => records,
                DependentStatus::Failed { .. } => 0,
            })
            .sum()
    }
}
