//! Job DTOs for inter-service communication

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;

/// Job status update sent from the worker to the job store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: JobStatus,
    /// Human-readable failure reason, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UpdateStatusRequest {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
