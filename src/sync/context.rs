//! Per-run context handed to every workflow step

use crate::sync::RunPhase;
use crate::workflow::Workflow;
use crate::SyncError;
use chrono::{DateTime, Utc};
use tracing::Span;
use uuid::Uuid;

/// Identity, logging scope and phase of one synchronization run
///
/// Every log line emitted inside [`RunContext::span`] carries the run id and
/// the workflow name, so interleaved runs can be told apart in the output.
#[derive(Debug)]
pub struct RunContext {
    run_id: Uuid,
    workflow: Workflow,
    started_at: DateTime<Utc>,
    phase: RunPhase,
    span: Span,
}

impl RunContext {
    pub fn new(workflow: Workflow) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sync_run", run_id = %run_id, workflow = %workflow);

        Self {
            run_id,
            workflow,
            started_at: Utc::now(),
            phase: RunPhase::Idle,
            span,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn workflow(&self) -> Workflow {
        self.workflow
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Moves the run to `to`, failing if the transition is out of order
    pub fn advance(&mut self, to: RunPhase) -> Result<(), SyncError> {
        if !self.phase.can_transition_to(to) {
            return Err(SyncError::InvalidTransition {
                from: self.phase,
                to,
            });
        }

        tracing::info!(parent: &self.span, from = %self.phase, to = %to, "Run phase changed");
        self.phase = to;
        Ok(())
    }
}
