//! Recording DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::recording::AudioFormat;

/// Fields of a recording to be appended to the job store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRecording {
    pub uri: String,
    pub performance_id: Uuid,
    pub label: String,
    pub format: AudioFormat,
}

impl CreateRecording {
    /// Builds the deterministic recording for an artifact of the given format
    pub fn deterministic(performance_id: Uuid, format: AudioFormat, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            performance_id,
            label: format.deterministic_label().to_string(),
            format,
        }
    }
}
