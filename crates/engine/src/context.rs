// crates/engine/src/context.rs
use tokio_util::sync::CancellationToken;

use taskmill_core::{ExecutionState, JobId, ProgressMeta};

use crate::backend::ResultBackend;

/// Handed to a handler for the duration of one job. The only way handler
/// code can reach the outside world: progress reporting and the wind-down
/// signal. Handlers never see the queue or the job store.
#[derive(Clone)]
pub struct JobContext {
    job_id: JobId,
    backend: ResultBackend,
    winddown: CancellationToken,
}

impl JobContext {
    pub fn new(job_id: JobId, backend: ResultBackend, winddown: CancellationToken) -> Self {
        Self {
            job_id,
            backend,
            winddown,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Publish a PROGRESS update. Best effort: each call overwrites the
    /// previous state for this job, and a backend that is already gone only
    /// costs a log line.
    pub fn report_progress(&self, current: u64, total: u64, message: impl Into<String>) {
        let meta = ProgressMeta::new(current, total, message);
        if let Err(e) = self
            .backend
            .record(&self.job_id, ExecutionState::progress(meta))
        {
            tracing::warn!(job_id = %self.job_id, error = %e, "Dropped progress report");
        }
    }

    /// True once the soft time budget has elapsed. Cooperative: a handler
    /// that sees this should return promptly, typically with an error.
    pub fn winding_down(&self) -> bool {
        self.winddown.is_cancelled()
    }
}
