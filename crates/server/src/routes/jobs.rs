// crates/server/src/routes/jobs.rs
//! API routes for job submission and status.
//!
//! - POST /jobs — Submit a job for background execution
//! - GET /jobs — List recent jobs (merged status views)
//! - GET /jobs/{job_id} — Merged status view for one job
//! - GET /jobs/stream — SSE stream of execution state transitions

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use taskmill_core::{JobDescriptor, JobRecord, JobStatusView, JobType};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_submission;
use crate::reconcile;
use crate::state::AppState;

/// Default and maximum page sizes for the recent-jobs listing.
const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 200;

/// Request body for job submission.
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub job_type: String,
    /// Free-form handler parameters. Each handler applies its own defaults,
    /// so an empty mapping is always acceptable.
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Query parameters for the recent-jobs listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<u32>,
}

/// POST /api/jobs — Validate, enqueue, then persist a pending record.
///
/// Validation happens before the broker sees the descriptor, so an unknown
/// job type never consumes a job id. The store write comes after the
/// enqueue and is deliberately non-fatal: the work is already queued, so an
/// insert failure is logged and the response still carries the record the
/// client can poll.
async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitJobRequest>,
) -> ApiResult<(StatusCode, Json<JobStatusView>)> {
    let job_type: JobType = request
        .job_type
        .parse()
        .map_err(|_| ApiError::UnknownJobType(request.job_type.clone()))?;

    let descriptor = JobDescriptor::new(job_type, serde_json::Value::Object(request.params));
    let job_id = state.queue.enqueue(descriptor.clone())?;
    record_submission(job_type.as_str());

    let record = JobRecord::pending(job_id.clone(), &descriptor, Utc::now());
    if let Err(e) = state.store.insert_job(&record).await {
        tracing::error!(
            job_id = %job_id,
            error = %e,
            "Failed to persist job record after enqueue; job will execute but status reads will 404"
        );
    }

    tracing::info!(job_id = %job_id, job_type = %job_type, "Job submitted");
    Ok((StatusCode::CREATED, Json(reconcile::merge(record, None))))
}

/// GET /api/jobs/{job_id} — Merged status view for one job.
async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusView>> {
    let view = reconcile::job_view(&state.store, &state.backend, &job_id).await?;
    Ok(Json(view))
}

/// GET /api/jobs — Most recent submissions, newest first.
async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<Vec<JobStatusView>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let records = state.store.list_recent_jobs(limit).await?;

    let mut views = Vec::with_capacity(records.len());
    for record in records {
        let execution = state.backend.get(&record.job_id).await?;
        views.push(reconcile::merge(record, execution));
    }
    Ok(Json(views))
}

/// GET /api/jobs/stream — SSE stream of applied execution state updates.
///
/// A slow consumer that falls behind the broadcast buffer skips the missed
/// updates and keeps receiving, rather than tearing down the stream.
async fn stream_jobs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.backend.subscribe();

    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let json = serde_json::to_string(&update).unwrap_or_default();
                    yield Ok(Event::default().data(json));
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "SSE subscriber lagged; skipping missed updates");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream)
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(submit_job).get(list_jobs))
        .route("/jobs/stream", get(stream_jobs))
        .route("/jobs/{job_id}", get(job_status))
}
