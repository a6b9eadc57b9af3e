// crates/engine/src/config.rs
use std::time::Duration;

/// Tunables for the worker pool and result backend.
///
/// The defaults mirror a conventional queue-worker deployment: four workers,
/// a prefetch window of four descriptors per worker, recycling after a
/// thousand jobs, and a 270s/300s soft/hard time budget per job.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// How many undispatched jobs one worker may hold locally, counting the
    /// one it is about to execute.
    pub prefetch: usize,
    /// Jobs a worker executes before it is retired and replaced.
    pub max_jobs_per_worker: u64,
    /// Past this budget the handler is signalled to wind down.
    pub soft_time_limit: Duration,
    /// Past this budget the handler is forcibly aborted.
    pub time_limit: Duration,
    /// How long the result backend keeps execution state after its last write.
    pub result_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            prefetch: 4,
            max_jobs_per_worker: 1000,
            soft_time_limit: Duration::from_secs(270),
            time_limit: Duration::from_secs(300),
            result_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}
