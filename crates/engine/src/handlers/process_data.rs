// crates/engine/src/handlers/process_data.rs
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use taskmill_core::{JobType, ProcessDataParams};

use crate::context::JobContext;
use crate::error::HandlerError;
use crate::handler::JobHandler;

/// Simulated data processing: one one-second step per unit of
/// `processing_time`, each reported as progress.
pub struct ProcessDataHandler;

#[async_trait]
impl JobHandler for ProcessDataHandler {
    fn job_type(&self) -> JobType {
        JobType::ProcessData
    }

    async fn run(&self, params: Value, ctx: JobContext) -> Result<Value, HandlerError> {
        let p: ProcessDataParams = serde_json::from_value(params)?;
        tracing::info!(job_id = %ctx.job_id(), data_id = ?p.data_id, "Processing data entry");

        for i in 1..=p.processing_time {
            if ctx.winding_down() {
                return Err(HandlerError::msg("soft time limit exceeded"));
            }
            sleep(Duration::from_secs(1)).await;
            ctx.report_progress(
                i,
                p.processing_time,
                format!("Processing step {i}/{}", p.processing_time),
            );
        }

        Ok(json!({
            "data_id": p.data_id,
            "processed_at": Utc::now().to_rfc3339(),
            "items_processed": rand::thread_rng().gen_range(100u64..=1000),
            "success": true,
        }))
    }
}
