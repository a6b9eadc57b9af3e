// crates/server/src/reconcile.rs
//! Merges the durable job record with live execution state.
//!
//! The two stores are never linked transactionally. The job record is the
//! authority on *existence*; the result backend is the authority on
//! *progress*. An id known only to the backend (a phantom left behind by a
//! failed store write) does not exist as far as clients are concerned.

use taskmill_core::{ExecutionPhase, ExecutionState, JobRecord, JobStatusView};
use taskmill_engine::ResultBackend;
use taskmill_store::JobStore;

use crate::error::{ApiError, ApiResult};

/// Look up the merged view for one job id.
pub async fn job_view(
    store: &JobStore,
    backend: &ResultBackend,
    job_id: &str,
) -> ApiResult<JobStatusView> {
    let Some(record) = store.get_job(job_id).await? else {
        return Err(ApiError::JobNotFound(job_id.to_string()));
    };
    let execution = backend.get(job_id).await?;
    Ok(merge(record, execution))
}

/// Combine a job record with whatever the result backend knows.
///
/// Identity and creation metadata come from the record; live status comes
/// from the execution state when present. A job the engine has not picked
/// up yet, or whose state has been pruned, reports the record's stored
/// status instead.
pub fn merge(record: JobRecord, execution: Option<ExecutionState>) -> JobStatusView {
    let mut view = JobStatusView {
        job_id: record.job_id,
        status: record.status,
        job_type: record.job_type,
        created_at: record.created_at,
        result: None,
        error: None,
    };

    if let Some(state) = execution {
        view.status = state.phase.as_status();
        match state.phase {
            ExecutionPhase::Success => view.result = state.result,
            ExecutionPhase::Failure => view.error = state.error,
            _ => {}
        }
    }

    view
}
