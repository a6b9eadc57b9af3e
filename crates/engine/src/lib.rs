// crates/engine/src/lib.rs
//! Execution engine: broker queue, result backend, and the worker pool that
//! connects them. Submission pushes descriptors into the [`JobQueue`]; workers
//! pull them, run the matching [`JobHandler`], and publish state transitions
//! to the [`ResultBackend`]. Nothing in here touches the durable job store.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod queue;
pub mod worker;

pub use backend::{ResultBackend, StateUpdate};
pub use config::EngineConfig;
pub use context::JobContext;
pub use error::{EngineError, HandlerError};
pub use handler::{HandlerRegistry, JobHandler};
pub use queue::{JobQueue, QueuedJob};
pub use worker::WorkerPool;
