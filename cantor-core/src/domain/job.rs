//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Render job record
///
/// Created by the API layer in `Pending`; its status is afterwards owned by
/// the worker's scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Reference to the render's input document
    pub input_file: String,
    /// Target name for the produced artifacts
    pub out_file: String,
    pub status: JobStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Job lifecycle status
///
/// The only legal path is `Pending -> Started -> {Satisfied | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Started,
    Satisfied,
    Failed,
}

impl JobStatus {
    /// Returns true once the job can no longer change status
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Satisfied | JobStatus::Failed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Started)
                | (JobStatus::Started, JobStatus::Satisfied)
                | (JobStatus::Started, JobStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Started => "started",
            JobStatus::Satisfied => "satisfied",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
