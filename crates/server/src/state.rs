// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use taskmill_engine::{JobQueue, ResultBackend};
use taskmill_store::JobStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Durable job store (system of record for submitted jobs).
    pub store: JobStore,
    /// Broker queue feeding the worker pool.
    pub queue: JobQueue,
    /// Ephemeral execution state backend (live status, progress, results).
    pub backend: ResultBackend,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(store: JobStore, queue: JobQueue, backend: ResultBackend) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            store,
            queue,
            backend,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
