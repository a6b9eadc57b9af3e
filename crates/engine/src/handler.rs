// crates/engine/src/handler.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use taskmill_core::JobType;

use crate::context::JobContext;
use crate::error::HandlerError;
use crate::handlers;

/// One executable job type.
///
/// Implementations are pure functions of `(params, ctx)`: params arrive as
/// raw JSON (deserialize with `?`, a malformed payload is a job failure, not
/// a submission failure), and all side effects go through the [`JobContext`].
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Wire name this handler executes.
    fn job_type(&self) -> JobType;

    async fn run(
        &self,
        params: serde_json::Value,
        ctx: JobContext,
    ) -> Result<serde_json::Value, HandlerError>;
}

/// Lookup table from job type to handler, fixed at engine start.
pub struct HandlerRegistry {
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the four built-in handlers.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(handlers::ProcessDataHandler));
        registry.register(Arc::new(handlers::GenerateReportHandler));
        registry.register(Arc::new(handlers::SimulateLoadHandler));
        registry.register(Arc::new(handlers::LongRunningTaskHandler));
        registry
    }

    /// Register a handler, replacing any previous one for the same type.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.job_type(), handler);
    }

    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&job_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
