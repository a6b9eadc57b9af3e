// crates/core/src/error.rs
use thiserror::Error;

/// Errors produced while parsing wire-level job vocabulary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown job type: {name}")]
    InvalidJobType { name: String },

    #[error("Unknown job status: {value}")]
    InvalidStatus { value: String },

    #[error("Unknown execution phase: {value}")]
    InvalidPhase { value: String },
}

impl CoreError {
    pub fn invalid_job_type(name: impl Into<String>) -> Self {
        Self::InvalidJobType { name: name.into() }
    }
}
