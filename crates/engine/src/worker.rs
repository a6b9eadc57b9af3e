// crates/engine/src/worker.rs
//! Worker pool: N independent workers pulling from the shared queue, each
//! processing one job to completion before taking the next. Per-job faults
//! (errors, panics, blown time budgets) are recorded as FAILURE states and
//! never take the worker down; workers themselves are retired and replaced
//! after a bounded number of jobs.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use taskmill_core::{ExecutionState, ProgressMeta};

use crate::backend::ResultBackend;
use crate::config::EngineConfig;
use crate::context::JobContext;
use crate::handler::HandlerRegistry;
use crate::queue::{JobQueue, QueuedJob};

/// Handle to the running pool. Dropping it does not stop the workers; call
/// [`shutdown`](Self::shutdown) (or cancel the token passed to `start`) for
/// a drain that lets in-flight jobs finish.
pub struct WorkerPool {
    supervisors: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// Spawn the configured number of workers.
    pub fn start(
        config: EngineConfig,
        queue: JobQueue,
        backend: ResultBackend,
        registry: Arc<HandlerRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        let supervisors = (0..config.workers)
            .map(|slot| {
                tokio::spawn(supervise_worker(
                    slot,
                    config.clone(),
                    queue.clone(),
                    backend.clone(),
                    Arc::clone(&registry),
                    cancel.clone(),
                ))
            })
            .collect();
        tracing::info!(workers = config.workers, "Worker pool started");
        Self { supervisors, cancel }
    }

    /// Signal shutdown and wait for every worker to finish its in-flight job.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.supervisors {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker supervisor did not shut down cleanly");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

enum WorkerExit {
    Recycled,
    Shutdown,
}

/// Keeps one worker slot occupied: when a generation retires after
/// `max_jobs_per_worker` jobs, a replacement takes over the slot.
async fn supervise_worker(
    slot: usize,
    config: EngineConfig,
    queue: JobQueue,
    backend: ResultBackend,
    registry: Arc<HandlerRegistry>,
    cancel: CancellationToken,
) {
    let mut generation: u64 = 0;
    loop {
        match run_worker(slot, &config, &queue, &backend, &registry, &cancel).await {
            WorkerExit::Shutdown => break,
            WorkerExit::Recycled => {
                tracing::info!(slot, generation, "Recycling worker");
                generation += 1;
            }
        }
    }
    tracing::debug!(slot, "Worker slot stopped");
}

async fn run_worker(
    slot: usize,
    config: &EngineConfig,
    queue: &JobQueue,
    backend: &ResultBackend,
    registry: &Arc<HandlerRegistry>,
    cancel: &CancellationToken,
) -> WorkerExit {
    let mut executed: u64 = 0;
    let mut local: VecDeque<QueuedJob> = VecDeque::new();

    loop {
        if cancel.is_cancelled() {
            if !local.is_empty() {
                tracing::warn!(
                    slot,
                    dropped = local.len(),
                    "Shutting down with prefetched jobs unexecuted"
                );
            }
            return WorkerExit::Shutdown;
        }

        let job = match local.pop_front() {
            Some(job) => job,
            None => {
                tokio::select! {
                    _ = cancel.cancelled() => return WorkerExit::Shutdown,
                    job = queue.dequeue() => {
                        let Some(job) = job else {
                            return WorkerExit::Shutdown;
                        };
                        // Hold up to prefetch-1 additional descriptors locally
                        // while we already own the slot.
                        while local.len() + 1 < config.prefetch {
                            match queue.try_dequeue().await {
                                Some(extra) => local.push_back(extra),
                                None => break,
                            }
                        }
                        job
                    }
                }
            }
        };

        execute_job(job, config, backend, registry).await;
        executed += 1;

        if executed >= config.max_jobs_per_worker && local.is_empty() {
            return WorkerExit::Recycled;
        }
    }
}

/// Run one job under the soft/hard time budgets, recording the terminal
/// execution state. Never returns an error: every fault ends up in the
/// result backend instead.
async fn execute_job(
    job: QueuedJob,
    config: &EngineConfig,
    backend: &ResultBackend,
    registry: &Arc<HandlerRegistry>,
) {
    let QueuedJob { job_id, descriptor } = job;
    let job_type = descriptor.job_type;
    let started = tokio::time::Instant::now();

    // Pickup marker: make the handoff observable before the handler's first
    // own report.
    record(
        backend,
        &job_id,
        ExecutionState::progress(ProgressMeta::new(0, 0, format!("Executing {job_type}"))),
    );

    let Some(handler) = registry.get(job_type) else {
        tracing::error!(job_id = %job_id, job_type = %job_type, "No handler registered");
        record(
            backend,
            &job_id,
            ExecutionState::failure(format!("No handler registered for job type: {job_type}")),
        );
        finish_metrics(job_type.as_str(), "failure", started);
        return;
    };

    let winddown = CancellationToken::new();
    let ctx = JobContext::new(job_id.clone(), backend.clone(), winddown.clone());

    let mut task = tokio::spawn({
        let handler = Arc::clone(&handler);
        let params = descriptor.params;
        async move { handler.run(params, ctx).await }
    });

    let soft_deadline = tokio::time::sleep(config.soft_time_limit);
    let hard_deadline = tokio::time::sleep(config.time_limit);
    tokio::pin!(soft_deadline, hard_deadline);
    let mut soft_fired = false;

    let outcome = loop {
        tokio::select! {
            outcome = &mut task => break outcome,
            _ = &mut soft_deadline, if !soft_fired => {
                soft_fired = true;
                tracing::warn!(
                    job_id = %job_id,
                    job_type = %job_type,
                    limit_secs = config.soft_time_limit.as_secs(),
                    "Soft time limit exceeded, signalling wind-down"
                );
                winddown.cancel();
            }
            _ = &mut hard_deadline => {
                task.abort();
                // Wait out the abort so no in-flight progress report can
                // land after the failure we are about to record.
                let _ = (&mut task).await;
                tracing::error!(
                    job_id = %job_id,
                    job_type = %job_type,
                    limit_secs = config.time_limit.as_secs(),
                    "Hard time limit exceeded, job aborted"
                );
                record(
                    backend,
                    &job_id,
                    ExecutionState::failure(format!(
                        "Hard time limit ({}s) exceeded",
                        config.time_limit.as_secs()
                    )),
                );
                finish_metrics(job_type.as_str(), "failure", started);
                return;
            }
        }
    };

    match outcome {
        Ok(Ok(result)) => {
            tracing::info!(
                job_id = %job_id,
                job_type = %job_type,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job succeeded"
            );
            record(backend, &job_id, ExecutionState::success(result));
            finish_metrics(job_type.as_str(), "success", started);
        }
        Ok(Err(e)) => {
            tracing::warn!(job_id = %job_id, job_type = %job_type, error = %e, "Job failed");
            record(backend, &job_id, ExecutionState::failure(e.to_string()));
            finish_metrics(job_type.as_str(), "failure", started);
        }
        Err(join_err) => {
            let description = panic_description(join_err);
            tracing::error!(job_id = %job_id, job_type = %job_type, "{description}");
            record(backend, &job_id, ExecutionState::failure(description));
            finish_metrics(job_type.as_str(), "failure", started);
        }
    }
}

fn record(backend: &ResultBackend, job_id: &str, state: ExecutionState) {
    if let Err(e) = backend.record(job_id, state) {
        tracing::warn!(job_id = %job_id, error = %e, "Dropped execution state update");
    }
}

fn finish_metrics(job_type: &'static str, outcome: &'static str, started: tokio::time::Instant) {
    metrics::counter!(
        "taskmill_jobs_completed_total",
        "job_type" => job_type,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("taskmill_job_duration_seconds", "job_type" => job_type)
        .record(started.elapsed().as_secs_f64());
}

fn panic_description(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "opaque panic payload".to_string()
            };
            format!("handler panicked: {msg}")
        }
        Err(e) => format!("handler task aborted: {e}"),
    }
}
