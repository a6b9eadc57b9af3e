// crates/engine/src/error.rs
use thiserror::Error;

/// Engine plumbing errors: the queue or the backend task is gone.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Result backend is unavailable")]
    BackendClosed,
}

/// What a handler reports when it cannot produce a result. Captured as a
/// FAILURE execution state; never propagated past the worker.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid params: {0}")]
    InvalidParams(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
