//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms, gauges)
//! - Helper functions for recording metrics

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup, before any metrics are recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    // Install the recorder globally
    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    // Store the handle for later rendering
    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    // Describe all metrics
    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

/// Describe all application metrics for Prometheus.
fn describe_metrics() {
    // Submission metrics
    describe_counter!(
        "taskmill_jobs_submitted_total",
        "Total jobs accepted for execution, by job type"
    );

    // Execution metrics (recorded by the worker pool)
    describe_counter!(
        "taskmill_jobs_completed_total",
        "Total jobs that reached a terminal state, by job type and outcome"
    );
    describe_histogram!(
        "taskmill_job_duration_seconds",
        "Handler execution time in seconds, by job type"
    );

    // Broker metrics
    describe_gauge!(
        "taskmill_queue_depth",
        "Jobs enqueued on the broker but not yet dequeued by a worker"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record an accepted submission.
pub fn record_submission(job_type: &str) {
    counter!("taskmill_jobs_submitted_total", "job_type" => job_type.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_submission_without_recorder() {
        // With no recorder installed this is a no-op; it must not panic.
        record_submission("process_data");
    }

    #[test]
    fn test_render_metrics_before_init() {
        // Before init, render_metrics returns None (unless another test initialized it)
        // This is a weak test since test order isn't guaranteed
        let _ = render_metrics();
    }
}
