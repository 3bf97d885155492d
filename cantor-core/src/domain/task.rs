//! Render task domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata tying a job to a performance
///
/// One-to-one with a [`Job`](super::job::Job) and immutable after creation.
/// The name is used to derive artifact file names and the performance id
/// addresses the downstream notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTask {
    pub id: Uuid,
    /// Artifact base name
    pub name: String,
    pub performance_id: Uuid,
    pub job_id: Uuid,
}
