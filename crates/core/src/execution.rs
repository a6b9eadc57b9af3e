// crates/core/src/execution.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::job::JobStatus;

/// Result-backend state for one job. Uppercase on the wire, the backend's
/// native vocabulary rather than the client-facing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionPhase {
    Pending,
    Progress,
    Success,
    Failure,
    Retry,
}

impl ExecutionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPhase::Pending => "PENDING",
            ExecutionPhase::Progress => "PROGRESS",
            ExecutionPhase::Success => "SUCCESS",
            ExecutionPhase::Failure => "FAILURE",
            ExecutionPhase::Retry => "RETRY",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionPhase::Success | ExecutionPhase::Failure)
    }

    /// Map into the client-facing status vocabulary. PROGRESS reads as
    /// "started": the job has been picked up but is not yet terminal.
    pub fn as_status(&self) -> JobStatus {
        match self {
            ExecutionPhase::Pending => JobStatus::Pending,
            ExecutionPhase::Progress => JobStatus::Started,
            ExecutionPhase::Success => JobStatus::Success,
            ExecutionPhase::Failure => JobStatus::Failure,
            ExecutionPhase::Retry => JobStatus::Retry,
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionPhase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ExecutionPhase::Pending),
            "PROGRESS" => Ok(ExecutionPhase::Progress),
            "SUCCESS" => Ok(ExecutionPhase::Success),
            "FAILURE" => Ok(ExecutionPhase::Failure),
            "RETRY" => Ok(ExecutionPhase::Retry),
            other => Err(CoreError::InvalidPhase {
                value: other.to_string(),
            }),
        }
    }
}

/// Free-form progress payload attached to a PROGRESS phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMeta {
    pub current: u64,
    pub total: u64,
    pub message: String,
}

impl ProgressMeta {
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }
}

/// Everything the result backend holds for one job id. Last write wins;
/// a single worker owns the job, so writes for one id never race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    pub phase: ExecutionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ProgressMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ExecutionState {
    pub fn progress(meta: ProgressMeta) -> Self {
        Self {
            phase: ExecutionPhase::Progress,
            meta: Some(meta),
            result: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn success(result: serde_json::Value) -> Self {
        Self {
            phase: ExecutionPhase::Success,
            meta: None,
            result: Some(result),
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            phase: ExecutionPhase::Failure,
            meta: None,
            result: None,
            error: Some(error.into()),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn phase_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&ExecutionPhase::Progress).unwrap(),
            "\"PROGRESS\""
        );
        assert_eq!(
            "SUCCESS".parse::<ExecutionPhase>().unwrap(),
            ExecutionPhase::Success
        );
        assert!("success".parse::<ExecutionPhase>().is_err());
    }

    #[test]
    fn phase_maps_into_status_vocabulary() {
        assert_eq!(ExecutionPhase::Pending.as_status(), JobStatus::Pending);
        assert_eq!(ExecutionPhase::Progress.as_status(), JobStatus::Started);
        assert_eq!(ExecutionPhase::Success.as_status(), JobStatus::Success);
        assert_eq!(ExecutionPhase::Failure.as_status(), JobStatus::Failure);
        assert_eq!(ExecutionPhase::Retry.as_status(), JobStatus::Retry);
    }

    #[test]
    fn terminal_phases() {
        assert!(ExecutionPhase::Success.is_terminal());
        assert!(ExecutionPhase::Failure.is_terminal());
        assert!(!ExecutionPhase::Progress.is_terminal());
        assert!(!ExecutionPhase::Pending.is_terminal());
    }

    #[test]
    fn constructors_fill_the_right_fields() {
        let s = ExecutionState::progress(ProgressMeta::new(3, 10, "step 3/10"));
        assert_eq!(s.phase, ExecutionPhase::Progress);
        assert_eq!(s.meta.unwrap().current, 3);
        assert!(s.result.is_none());

        let s = ExecutionState::success(serde_json::json!({"ok": true}));
        assert_eq!(s.phase, ExecutionPhase::Success);
        assert!(s.result.is_some());
        assert!(s.error.is_none());

        let s = ExecutionState::failure("boom");
        assert_eq!(s.phase, ExecutionPhase::Failure);
        assert_eq!(s.error.as_deref(), Some("boom"));
    }
}
