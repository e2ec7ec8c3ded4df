//! Sync module: the catalog synchronizer
//!
//! A run moves through a fixed sequence of phases: the catalog table is
//! replaced, its keys are read back from the store, and the dependents of each
//! key are fetched and persisted with per-key failure isolation.
//!
//! # Components
//!
//! - `RunPhase`: the phases of one run and their legal transitions
//! - `RunContext`: run id, logging span and current phase
//! - `sync_dependents`: the per-key fetch, extract and persist loop
//! - `SyncReport`: the inspectable outcome of a run

mod context;
mod dependents;
mod phase;
mod report;

pub use context::RunContext;
pub use dependents::{sync_dependents, DependentPlan, DependentTask, FanOut};
pub use phase::RunPhase;
pub use report::{CatalogOutcome, DependentOutcome, DependentStatus, FailureStage, SyncReport};
