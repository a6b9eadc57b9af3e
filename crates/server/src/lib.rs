// crates/server/src/lib.rs
//! Taskmill server library.
//!
//! This crate provides the Axum-based HTTP server for the taskmill job
//! system: job submission, merged status reads, a live progress stream,
//! and operational endpoints (health, Prometheus metrics).

pub mod config;
pub mod error;
pub mod metrics;
pub mod reconcile;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::*;
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (jobs, health) plus the Prometheus endpoint
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> axum::response::Response {
        app.oneshot(request).await.unwrap()
    }

    // ========================================================================
    // Routing
    // ========================================================================

    #[tokio::test]
    async fn test_api_surface_is_mounted_under_api_prefix() {
        let app = test_app().await;

        let listed = send(app.clone(), get("/api/jobs")).await;
        assert_eq!(listed.status(), StatusCode::OK);

        // The same paths without the prefix are not routes.
        let bare_jobs = send(app.clone(), get("/jobs")).await;
        assert_eq!(bare_jobs.status(), StatusCode::NOT_FOUND);

        let bare_health = send(app, get("/health")).await;
        assert_eq!(bare_health.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_404() {
        let app = test_app().await;
        let response = send(app, get("/api/does-not-exist")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ========================================================================
    // Middleware
    // ========================================================================

    #[tokio::test]
    async fn test_cross_origin_requests_are_allowed() {
        let app = test_app().await;

        let request = Request::builder()
            .uri("/api/health")
            .header("Origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = send(app, request).await;

        let allow_origin = response.headers().get("access-control-allow-origin");
        assert_eq!(allow_origin.map(|v| v.to_str().unwrap()), Some("*"));
    }

    #[tokio::test]
    async fn test_app_serves_repeated_requests() {
        let app = test_app().await;

        for _ in 0..3 {
            let response = send(app.clone(), get("/api/health")).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
