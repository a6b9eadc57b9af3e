// crates/core/src/job.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Broker-assigned job identifier (UUIDv4 string on the wire)
pub type JobId = String;

/// The fixed set of job types the engine knows how to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    ProcessData,
    GenerateReport,
    SimulateLoad,
    LongRunningTask,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::ProcessData,
        JobType::GenerateReport,
        JobType::SimulateLoad,
        JobType::LongRunningTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::ProcessData => "process_data",
            JobType::GenerateReport => "generate_report",
            JobType::SimulateLoad => "simulate_load",
            JobType::LongRunningTask => "long_running_task",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process_data" => Ok(JobType::ProcessData),
            "generate_report" => Ok(JobType::GenerateReport),
            "simulate_load" => Ok(JobType::SimulateLoad),
            "long_running_task" => Ok(JobType::LongRunningTask),
            other => Err(CoreError::invalid_job_type(other)),
        }
    }
}

/// Client-facing job status, shared by the stored record and the merged view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Started,
    Success,
    Failure,
    Retry,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Started => "started",
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::Retry => "retry",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "started" => Ok(JobStatus::Started),
            "success" => Ok(JobStatus::Success),
            "failure" => Ok(JobStatus::Failure),
            "retry" => Ok(JobStatus::Retry),
            other => Err(CoreError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// The `{job_type, params}` payload handed to the broker at submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_type: JobType,
    pub params: serde_json::Value,
}

impl JobDescriptor {
    pub fn new(job_type: JobType, params: serde_json::Value) -> Self {
        Self { job_type, params }
    }
}

/// Durable record of one submission. Written exactly once; the engine never
/// touches it, so `status` stays at its creation-time value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    /// A fresh pending record for a descriptor the broker just accepted.
    pub fn pending(job_id: JobId, descriptor: &JobDescriptor, created_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            job_type: descriptor.job_type,
            status: JobStatus::Pending,
            params: descriptor.params.clone(),
            created_at,
        }
    }
}

/// Merged status view: record metadata plus live execution state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub job_type: JobType,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
