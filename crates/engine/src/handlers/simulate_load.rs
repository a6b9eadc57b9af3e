// crates/engine/src/handlers/simulate_load.rs
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use taskmill_core::{JobType, LoadIntensity, SimulateLoadParams};

use crate::context::JobContext;
use crate::error::HandlerError;
use crate::handler::JobHandler;

/// Bounded busy-work for a wall-clock duration: one batch of CPU work per
/// one-second round, at an operations-per-second rate picked by intensity.
pub struct SimulateLoadHandler;

#[async_trait]
impl JobHandler for SimulateLoadHandler {
    fn job_type(&self) -> JobType {
        JobType::SimulateLoad
    }

    async fn run(&self, params: Value, ctx: JobContext) -> Result<Value, HandlerError> {
        let p: SimulateLoadParams = serde_json::from_value(params)?;
        let rate = LoadIntensity::from_name(&p.intensity).ops_per_second();
        tracing::info!(
            job_id = %ctx.job_id(),
            intensity = %p.intensity,
            duration = p.duration,
            "Starting load simulation"
        );

        let mut total_operations: u64 = 0;
        let started = Instant::now();

        while started.elapsed() < Duration::from_secs(p.duration) {
            if ctx.winding_down() {
                return Err(HandlerError::msg("soft time limit exceeded"));
            }
            for _ in 0..rate {
                std::hint::black_box((0..100u64).map(|i| i * i).sum::<u64>());
                total_operations += 1;
            }
            sleep(Duration::from_secs(1)).await;
            let elapsed = started.elapsed().as_secs().min(p.duration);
            ctx.report_progress(elapsed, p.duration, format!("Running ({elapsed}/{}s)", p.duration));
        }

        let achieved = if p.duration == 0 {
            0.0
        } else {
            total_operations as f64 / p.duration as f64
        };
        Ok(json!({
            "duration": p.duration,
            "intensity": p.intensity,
            "total_operations": total_operations,
            "ops_per_second": achieved,
            "completed_at": Utc::now().to_rfc3339(),
        }))
    }
}
