// crates/engine/src/handlers/generate_report.rs
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use taskmill_core::{GenerateReportParams, JobType};

use crate::context::JobContext;
use crate::error::HandlerError;
use crate::handler::JobHandler;

const STAGES: [&str; 4] = ["Collecting data", "Analyzing", "Formatting", "Finalizing"];

/// Synthetic report generation: a fixed four-stage pipeline, two seconds per
/// stage, returning a descriptor for a file that does not exist.
pub struct GenerateReportHandler;

#[async_trait]
impl JobHandler for GenerateReportHandler {
    fn job_type(&self) -> JobType {
        JobType::GenerateReport
    }

    async fn run(&self, params: Value, ctx: JobContext) -> Result<Value, HandlerError> {
        let p: GenerateReportParams = serde_json::from_value(params)?;
        tracing::info!(job_id = %ctx.job_id(), report_type = %p.report_type, "Generating report");

        let total = STAGES.len() as u64;
        for (i, stage) in STAGES.iter().enumerate() {
            if ctx.winding_down() {
                return Err(HandlerError::msg("soft time limit exceeded"));
            }
            sleep(Duration::from_secs(2)).await;
            ctx.report_progress(i as u64 + 1, total, *stage);
        }

        Ok(json!({
            "report_type": p.report_type,
            "generated_at": Utc::now().to_rfc3339(),
            "pages": rand::thread_rng().gen_range(5u64..=50),
            "file_size_kb": rand::thread_rng().gen_range(100u64..=5000),
            "download_url": format!("/reports/{}_{}.pdf", p.report_type, Utc::now().timestamp()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ResultBackend;
    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_runs_the_four_stage_pipeline() {
        let backend = ResultBackend::spawn(Duration::from_secs(3600));
        let mut events = backend.subscribe();
        let ctx = JobContext::new("job-1".into(), backend.clone(), CancellationToken::new());

        let result = GenerateReportHandler
            .run(json!({"report_type": "analytics"}), ctx)
            .await
            .unwrap();

        assert_eq!(result["report_type"], "analytics");
        let pages = result["pages"].as_u64().unwrap();
        assert!((5..=50).contains(&pages));
        let size = result["file_size_kb"].as_u64().unwrap();
        assert!((100..=5000).contains(&size));
        let url = result["download_url"].as_str().unwrap();
        assert!(url.starts_with("/reports/analytics_"));
        assert!(url.ends_with(".pdf"));

        let _ = backend.get("job-1").await.unwrap();
        let mut stages = Vec::new();
        while let Ok(update) = events.try_recv() {
            stages.push(update.state.meta.unwrap().message);
        }
        assert_eq!(stages, STAGES.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_type_defaults_to_summary() {
        let backend = ResultBackend::spawn(Duration::from_secs(3600));
        let ctx = JobContext::new("job-1".into(), backend.clone(), CancellationToken::new());

        let result = GenerateReportHandler.run(json!({}), ctx).await.unwrap();
        assert_eq!(result["report_type"], "summary");
        assert!(result["download_url"]
            .as_str()
            .unwrap()
            .starts_with("/reports/summary_"));
    }
}
