//! Recording domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A persisted reference to a produced audio artifact
///
/// Append-only. One job produces a lossless and a compressed recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: Uuid,
    pub uri: String,
    pub performance_id: Uuid,
    pub label: String,
    pub format: AudioFormat,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Container or codec of a recorded artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Lossless container written by the renderer
    Wav,
    /// Compressed codec written by the transcoder
    Mp3,
}

impl AudioFormat {
    /// File extension used for artifacts of this format
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Recording label for the deterministic artifact of this format
    pub fn deterministic_label(self) -> &'static str {
        match self {
            AudioFormat::Wav => "deterministic-lossless",
            AudioFormat::Mp3 => "deterministic-compressed",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
