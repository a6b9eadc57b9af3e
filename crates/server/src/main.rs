// crates/server/src/main.rs
//! Taskmill server binary.
//!
//! Wires the composition root together: job store, result backend, broker
//! queue, worker pool, then the Axum HTTP server. Shutdown on ctrl-c is
//! warm: in-flight jobs finish, prefetched but unstarted descriptors are
//! dropped with a warning.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use taskmill_engine::{HandlerRegistry, JobQueue, ResultBackend, WorkerPool};
use taskmill_server::{create_app, init_metrics, AppState, Config};
use taskmill_store::JobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing from RUST_LOG, defaulting to info for our crates
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskmill=info")),
        )
        .init();

    let startup_start = Instant::now();

    // Initialize Prometheus metrics
    init_metrics();

    // Print banner
    eprintln!("\n\u{2699} taskmill v{}\n", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();

    // Step 1: Open the job store
    let store = match &config.db_path {
        Some(path) => JobStore::new(path).await?,
        None => JobStore::open_default().await?,
    };

    // Step 2: Spawn the result backend and broker queue
    let backend = ResultBackend::spawn(config.engine.result_ttl);
    let queue = JobQueue::new();

    // Step 3: Start the worker pool
    let cancel = CancellationToken::new();
    let registry = Arc::new(HandlerRegistry::builtin());
    let pool = WorkerPool::start(
        config.engine.clone(),
        queue.clone(),
        backend.clone(),
        registry,
        cancel,
    );

    // Step 4: Build the Axum app
    let state = AppState::new(store, queue, backend);
    let app = create_app(state);

    // Step 5: Bind and serve until shutdown
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    eprintln!(
        "  \u{2713} Ready in {:?} \u{2014} {} workers",
        startup_start.elapsed(),
        config.engine.workers,
    );
    eprintln!("  \u{2192} http://localhost:{}\n", config.port);

    tokio::select! {
        result = axum::serve(listener, app) => result?,
        _ = shutdown_signal() => {}
    }

    // Step 6: Drain the workers; in-flight jobs run to completion
    pool.shutdown().await;

    Ok(())
}

/// Resolves when ctrl-c arrives.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            // Without a signal handler there is nothing to wait for
            std::future::pending::<()>().await;
        }
    }
}
