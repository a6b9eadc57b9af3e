// crates/core/src/params.rs
//! Input parameter shapes for the built-in handlers. Submission hands params
//! through opaquely; these are deserialized at execution time, so a malformed
//! payload surfaces as a job failure rather than a submission error.

use serde::Deserialize;

fn default_processing_time() -> u64 {
    5
}

fn default_report_type() -> String {
    "summary".to_string()
}

fn default_duration() -> u64 {
    10
}

fn default_intensity() -> String {
    "medium".to_string()
}

fn default_iterations() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessDataParams {
    #[serde(default)]
    pub data_id: Option<String>,
    #[serde(default = "default_processing_time")]
    pub processing_time: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReportParams {
    #[serde(default = "default_report_type")]
    pub report_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateLoadParams {
    #[serde(default = "default_duration")]
    pub duration: u64,
    #[serde(default = "default_intensity")]
    pub intensity: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LongRunningParams {
    #[serde(default = "default_iterations")]
    pub iterations: u64,
}

/// Load-simulation intensity. Parsed leniently: unrecognized names fall back
/// to medium rather than failing the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadIntensity {
    Low,
    #[default]
    Medium,
    High,
}

impl LoadIntensity {
    pub fn from_name(name: &str) -> Self {
        match name {
            "low" => LoadIntensity::Low,
            "high" => LoadIntensity::High,
            _ => LoadIntensity::Medium,
        }
    }

    pub fn ops_per_second(&self) -> u64 {
        match self {
            LoadIntensity::Low => 10,
            LoadIntensity::Medium => 50,
            LoadIntensity::High => 100,
        }
    }
}
