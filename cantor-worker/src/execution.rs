//! Execution types for the Cantor worker
//!
//! These types only exist at runtime while a render is in flight.
//! They are not persisted or sent over the network as-is.

use cantor_core::domain::job::JobStatus;
use cantor_core::dto::job::UpdateStatusRequest;
use cantor_core::dto::recording::CreateRecording;
use std::time::Duration;
use thiserror::Error;

/// Artifacts produced by a successful render, ready to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifacts {
    /// Published lossless render
    pub lossless: CreateRecording,
    /// Transcoded, compressed render
    pub compressed: CreateRecording,
}

impl RenderedArtifacts {
    /// Public URL handed to the performance service
    pub fn public_url(&self) -> &str {
        &self.compressed.uri
    }

    /// Recordings to append, lossless first
    pub fn recordings(&self) -> [&CreateRecording; 2] {
        [&self.lossless, &self.compressed]
    }
}

/// Why a render produced no usable artifact
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderFailure {
    /// Could not prepare the directories artifacts are written to
    #[error("failed to prepare workspace: {0}")]
    Workspace(String),

    /// The renderer failed; carries its reported error payload
    #[error("{0}")]
    Renderer(String),

    /// The renderer exited cleanly without confirming completion
    #[error("renderer finished without a completion marker")]
    MissingCompletion,

    /// The renderer confirmed something other than completion
    #[error("renderer reported '{0}' instead of completion")]
    UnexpectedCompletion(String),

    #[error("transcoding failed: {0}")]
    Transcoder(String),

    /// One of the external processes ran past its limit
    #[error("{stage} timed out after {after:?}")]
    TimedOut { stage: &'static str, after: Duration },

    #[error("failed to publish lossless artifact: {0}")]
    Publish(String),
}

/// Terminal outcome of a scheduled run
///
/// Written once into the run's settlement by whichever side finishes first:
/// the render task or the watchdog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Rendered(RenderedArtifacts),
    Failed(RenderFailure),
    /// The watchdog saw the run exceed its budget
    Expired(Duration),
    /// The worker shut down while the run was in flight
    Interrupted,
}

impl RunOutcome {
    /// Status update that records this outcome in the job store
    pub fn status_update(&self) -> UpdateStatusRequest {
        match self {
            RunOutcome::Rendered(_) => UpdateStatusRequest::new(JobStatus::Satisfied),
            RunOutcome::Failed(failure) => {
                UpdateStatusRequest::new(JobStatus::Failed).with_reason(failure.to_string())
            }
            RunOutcome::Expired(budget) => UpdateStatusRequest::new(JobStatus::Failed)
                .with_reason(format!("render exceeded {:?}", budget)),
            RunOutcome::Interrupted => {
                UpdateStatusRequest::new(JobStatus::Failed).with_reason("worker shutting down")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantor_core::domain::recording::AudioFormat;
    use uuid::Uuid;

    fn artifacts() -> RenderedArtifacts {
        let performance_id = Uuid::new_v4();
        RenderedArtifacts {
            lossless: CreateRecording::deterministic(
                performance_id,
                AudioFormat::Wav,
                "http://cdn/a.wav",
            ),
            compressed: CreateRecording::deterministic(
                performance_id,
                AudioFormat::Mp3,
                "http://cdn/a.mp3",
            ),
        }
    }

    #[test]
    fn test_rendered_outcome() {
        let outcome = RunOutcome::Rendered(artifacts());
        let update = outcome.status_update();
        assert_eq!(update.status, JobStatus::Satisfied);
        assert!(update.reason.is_none());
    }

    #[test]
    fn test_renderer_failure_keeps_payload() {
        let outcome = RunOutcome::Failed(RenderFailure::Renderer("Bad template".to_string()));
        let update = outcome.status_update();
        assert_eq!(update.status, JobStatus::Failed);
        assert_eq!(update.reason.as_deref(), Some("Bad template"));
    }

    #[test]
    fn test_expired_outcome() {
        let update = RunOutcome::Expired(Duration::from_secs(50)).status_update();
        assert_eq!(update.status, JobStatus::Failed);
        assert_eq!(update.reason.as_deref(), Some("render exceeded 50s"));
    }

    #[test]
    fn test_timeout_message() {
        let failure = RenderFailure::TimedOut {
            stage: "renderer",
            after: Duration::from_secs(35),
        };
        assert_eq!(failure.to_string(), "renderer timed out after 35s");
    }

    #[test]
    fn test_public_url_is_compressed() {
        let artifacts = artifacts();
        assert_eq!(artifacts.public_url(), "http://cdn/a.mp3");
        assert_eq!(artifacts.recordings()[0].format, AudioFormat::Wav);
    }
}
