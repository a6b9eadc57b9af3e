//! API route handlers for the taskmill server.

pub mod health;
pub mod jobs;
pub mod metrics;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - POST /api/jobs - Submit a job for background execution
/// - GET /api/jobs - List recent jobs (merged status views)
/// - GET /api/jobs/{id} - Merged status view for one job
/// - GET /api/jobs/stream - SSE stream of execution state transitions
/// - GET /api/health - Health check
/// - GET /metrics - Prometheus metrics (no /api prefix)
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", jobs::router())
        .merge(metrics::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_api_routes_creation() {
        let _router = api_routes(test_state().await);
    }
}
