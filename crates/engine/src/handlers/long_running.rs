// crates/engine/src/handlers/long_running.rs
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use taskmill_core::{JobType, LongRunningParams};

use crate::context::JobContext;
use crate::error::HandlerError;
use crate::handler::JobHandler;

/// Progress is batched: one report per this many iterations.
const PROGRESS_EVERY: u64 = 10;

/// Many small iterations of simulated work, each drawing a random sample;
/// returns aggregate statistics over the samples.
pub struct LongRunningTaskHandler;

#[async_trait]
impl JobHandler for LongRunningTaskHandler {
    fn job_type(&self) -> JobType {
        JobType::LongRunningTask
    }

    async fn run(&self, params: Value, ctx: JobContext) -> Result<Value, HandlerError> {
        let p: LongRunningParams = serde_json::from_value(params)?;
        if p.iterations == 0 {
            return Err(HandlerError::msg("iterations must be at least 1"));
        }
        tracing::info!(job_id = %ctx.job_id(), iterations = p.iterations, "Starting long-running job");

        let mut sum: u64 = 0;
        let mut min = u64::MAX;
        let mut max: u64 = 0;

        for i in 1..=p.iterations {
            if ctx.winding_down() {
                return Err(HandlerError::msg("soft time limit exceeded"));
            }
            sleep(Duration::from_millis(500)).await;
            let sample = rand::thread_rng().gen_range(1u64..=100);
            sum += sample;
            min = min.min(sample);
            max = max.max(sample);

            if i % PROGRESS_EVERY == 0 {
                ctx.report_progress(
                    i,
                    p.iterations,
                    format!("Completed {i}/{} iterations", p.iterations),
                );
            }
        }

        Ok(json!({
            "iterations": p.iterations,
            "sum": sum,
            "average": sum as f64 / p.iterations as f64,
            "min": min,
            "max": max,
            "completed_at": Utc::now().to_rfc3339(),
        }))
    }
}
