/// Run phase definitions for tracking synchronization progress
///
/// This module defines the phases one synchronization run moves through and
/// which transitions between them are legal.
use std::fmt;

/// Represents the current phase of a synchronization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Run created, nothing fetched yet
    Idle,

    /// Fetching and replacing the catalog table
    SyncingCatalog,

    /// Reading the catalog keys back from the store
    ReadingCatalogKeys,

    /// Fetching and persisting the dependents of each catalog key
    SyncingDependents,

    /// All phases completed
    Done,
}

impl RunPhase {
    /// Returns the phase that legally follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::SyncingCatalog),
            Self::SyncingCatalog => Some(Self::ReadingCatalogKeys),
            Self::ReadingCatalogKeys => Some(Self::SyncingDependents),
            Self::SyncingDependents => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns true if a run in this phase may move to `to`
    ///
    /// Phases advance strictly in order; there are no retries or skips.
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SyncingCatalog => "syncing_catalog",
            Self::ReadingCatalogKeys => "reading_catalog_keys",
            Self::SyncingDependents => "syncing_dependents",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
