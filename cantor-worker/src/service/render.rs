//! Render service
//!
//! Handles one render job end to end:
//! - Running the renderer against the job's input document
//! - Confirming completion from the renderer's own output
//! - Transcoding the lossless render and publishing both artifacts
//! - Removing temporary files on every exit path
//!
//! Exit codes alone are not trusted: a renderer that exits 0 without printing
//! the completion marker has failed.

use async_trait::async_trait;
use cantor_core::domain::job::Job;
use cantor_core::domain::recording::AudioFormat;
use cantor_core::domain::task::RenderTask;
use cantor_core::dto::recording::CreateRecording;
use tracing::{debug, error, info};

use crate::config::RenderSettings;
use crate::execution::{RenderFailure, RenderedArtifacts};
use crate::process::markers::{self, Completion};
use crate::process::{ProcessOutcome, ProcessRunner};
use crate::service::artifacts::{ArtifactKind, ArtifactPaths, remove_artifact};

pub type RenderResult = Result<RenderedArtifacts, RenderFailure>;

/// Service trait for rendering a job
#[async_trait]
pub trait RenderService: Send + Sync {
    /// Renders a job
    ///
    /// # Arguments
    /// * `task` - The render task naming the artifacts and their performance
    /// * `job` - The job holding the input document reference
    ///
    /// # Returns
    /// The recordings to create, or why there are none
    async fn render(&self, task: &RenderTask, job: &Job) -> RenderResult;

    /// Removes whatever a render of this job that never finished left behind
    ///
    /// Called after the render future was dropped, so `render`'s own cleanup
    /// did not run.
    async fn discard(&self, task: &RenderTask, job: &Job);
}

/// Render service backed by the configured external programs
pub struct StandardRenderService {
    settings: RenderSettings,
    runner: ProcessRunner,
}

impl StandardRenderService {
    /// Creates a new render service
    pub fn new(settings: RenderSettings) -> Self {
        let runner = ProcessRunner::new(settings.error_marker.clone());
        Self { settings, runner }
    }

    async fn run_stages(&self, task: &RenderTask, paths: &ArtifactPaths) -> RenderResult {
        for dir in [&self.settings.work_dir, &self.settings.public_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                RenderFailure::Workspace(format!("{}: {}", dir.display(), e))
            })?;
        }

        self.render_lossless(paths).await?;
        self.transcode(paths).await?;

        tokio::fs::copy(&paths.lossless, &paths.published_lossless)
            .await
            .map_err(|e| RenderFailure::Publish(e.to_string()))?;

        let base_url = &self.settings.public_base_url;
        Ok(RenderedArtifacts {
            lossless: CreateRecording::deterministic(
                task.performance_id,
                AudioFormat::Wav,
                ArtifactPaths::public_url(base_url, &paths.published_lossless),
            ),
            compressed: CreateRecording::deterministic(
                task.performance_id,
                AudioFormat::Mp3,
                ArtifactPaths::public_url(base_url, &paths.compressed),
            ),
        })
    }

    async fn render_lossless(&self, paths: &ArtifactPaths) -> Result<(), RenderFailure> {
        let renderer = &self.settings.renderer;
        let args = renderer.args_with([
            paths.input.to_string_lossy(),
            paths.lossless.to_string_lossy(),
        ]);

        info!("Rendering {} into {}", paths.input.display(), paths.lossless.display());

        match self
            .runner
            .run(&renderer.program, &args, self.settings.renderer_timeout)
            .await
        {
            ProcessOutcome::Success { stdout, stderr } => {
                debug!(
                    "Renderer wrote {} stdout and {} stderr line(s)",
                    stdout.len(),
                    stderr.len()
                );
                match markers::completion(&stdout, &self.settings.completion_marker) {
                    Completion::Confirmed => {
                        debug!("Renderer confirmed completion");
                        Ok(())
                    }
                    Completion::Missing => Err(RenderFailure::MissingCompletion),
                    Completion::Unexpected(found) => {
                        Err(RenderFailure::UnexpectedCompletion(found))
                    }
                }
            }
            ProcessOutcome::Failure {
                exit_code,
                error,
                stdout,
                stderr,
            } => {
                debug!(
                    "Renderer exited with {:?} after {} stdout and {} stderr line(s)",
                    exit_code,
                    stdout.len(),
                    stderr.len()
                );
                Err(RenderFailure::Renderer(error))
            }
            ProcessOutcome::TimedOut { after } => Err(RenderFailure::TimedOut {
                stage: "renderer",
                after,
            }),
        }
    }

    async fn transcode(&self, paths: &ArtifactPaths) -> Result<(), RenderFailure> {
        let transcoder = &self.settings.transcoder;
        let args = transcoder.args_with([
            paths.lossless.to_string_lossy(),
            paths.compressed.to_string_lossy(),
        ]);

        info!("Transcoding {} into {}", paths.lossless.display(), paths.compressed.display());

        match self
            .runner
            .run(&transcoder.program, &args, self.settings.transcoder_timeout)
            .await
        {
            ProcessOutcome::Success { .. } => Ok(()),
            ProcessOutcome::Failure { error, .. } => Err(RenderFailure::Transcoder(error)),
            ProcessOutcome::TimedOut { after } => Err(RenderFailure::TimedOut {
                stage: "transcoder",
                after,
            }),
        }
    }

    /// Removes scratch files, plus partial public output when the render failed
    async fn cleanup(&self, paths: &ArtifactPaths, succeeded: bool) {
        remove_artifact(&paths.input, ArtifactKind::Input).await;
        remove_artifact(&paths.lossless, ArtifactKind::Lossless).await;

        if !succeeded {
            remove_artifact(&paths.compressed, ArtifactKind::Compressed).await;
            remove_artifact(&paths.published_lossless, ArtifactKind::Lossless).await;
        }
    }
}

#[async_trait]
impl RenderService for StandardRenderService {
    async fn render(&self, task: &RenderTask, job: &Job) -> RenderResult {
        let paths = ArtifactPaths::resolve(&self.settings, task, job);

        info!(
            "Starting render of job {} - task '{}' as {}",
            job.id, task.name, paths.stem
        );

        let result = self.run_stages(task, &paths).await;
        self.cleanup(&paths, result.is_ok()).await;

        match &result {
            Ok(artifacts) => info!("Job {} rendered to {}", job.id, artifacts.public_url()),
            Err(failure) => error!("Job {} failed to render: {}", job.id, failure),
        }

        result
    }

    async fn discard(&self, task: &RenderTask, job: &Job) {
        let paths = ArtifactPaths::resolve(&self.settings, task, job);
        info!("Discarding artifacts of cancelled job {} ({})", job.id, paths.stem);
        self.cleanup(&paths, false).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolCommand;
    use cantor_core::domain::job::JobStatus;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    const RENDER_OK: &str = r#"
printf 'RIFF' > "$2"
echo "rendering $1"
echo "status: xsynx completed xsynx"
"#;

    const RENDER_BAD_TEMPLATE: &str = r#"
echo "xsynxerror Bad template xsynxerror" >&2
exit 1
"#;

    const RENDER_SILENT: &str = r#"
printf 'RIFF' > "$2"
echo "done"
"#;

    const RENDER_HANG: &str = "sleep 10\n";

    const TRANSCODE_OK: &str = r#"cp "$1" "$2""#;

    const TRANSCODE_FAIL: &str = r#"
printf 'partial' > "$2"
echo "unsupported sample rate" >&2
exit 2
"#;

    struct Fixture {
        _dir: TempDir,
        settings: RenderSettings,
        job: Job,
        task: RenderTask,
    }

    impl Fixture {
        fn new(renderer: &str, transcoder: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let work_dir = dir.path().join("work");
            let public_dir = dir.path().join("public");
            std::fs::create_dir_all(&work_dir).unwrap();

            let renderer_script = write_script(dir.path(), "render.sh", renderer);
            let transcoder_script = write_script(dir.path(), "transcode.sh", transcoder);

            let settings = RenderSettings {
                renderer: ToolCommand::new("sh").arg(renderer_script),
                renderer_timeout: Duration::from_millis(500),
                transcoder: ToolCommand::new("sh").arg(transcoder_script),
                transcoder_timeout: Duration::from_secs(5),
                work_dir,
                public_dir,
                public_base_url: "http://cdn/audio".to_string(),
                ..RenderSettings::default()
            };

            let job = Job {
                id: Uuid::new_v4(),
                input_file: "score.json".to_string(),
                out_file: "take".to_string(),
                status: JobStatus::Started,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            let task = RenderTask {
                id: Uuid::new_v4(),
                name: "nocturne".to_string(),
                performance_id: Uuid::new_v4(),
                job_id: job.id,
            };

            std::fs::write(settings.work_dir.join("score.json"), b"{}").unwrap();

            Self {
                _dir: dir,
                settings,
                job,
                task,
            }
        }

        async fn render(&self) -> RenderResult {
            StandardRenderService::new(self.settings.clone())
                .render(&self.task, &self.job)
                .await
        }

        fn work(&self, name: &str) -> PathBuf {
            self.settings.work_dir.join(name)
        }

        fn public(&self, name: &str) -> PathBuf {
            self.settings.public_dir.join(name)
        }

        /// Name of this job's artifact with the given extension
        fn artifact(&self, ext: &str) -> String {
            format!("nocturne-take-{}.{}", self.job.id.simple(), ext)
        }
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_successful_render() {
        let fixture = Fixture::new(RENDER_OK, TRANSCODE_OK);
        let artifacts = fixture.render().await.unwrap();

        assert_eq!(
            artifacts.public_url(),
            format!("http://cdn/audio/{}", fixture.artifact("mp3"))
        );
        assert_eq!(
            artifacts.lossless.uri,
            format!("http://cdn/audio/{}", fixture.artifact("wav"))
        );
        assert_eq!(artifacts.lossless.label, "deterministic-lossless");
        assert_eq!(artifacts.compressed.label, "deterministic-compressed");
        assert_eq!(artifacts.compressed.performance_id, fixture.task.performance_id);

        // Published artifacts remain, scratch files are gone
        assert!(fixture.public(&fixture.artifact("mp3")).exists());
        assert!(fixture.public(&fixture.artifact("wav")).exists());
        assert!(!fixture.work("score.json").exists());
        assert!(!fixture.work(&fixture.artifact("wav")).exists());
    }

    #[tokio::test]
    async fn test_renderer_error_marker() {
        let fixture = Fixture::new(RENDER_BAD_TEMPLATE, TRANSCODE_OK);
        let failure = fixture.render().await.unwrap_err();

        assert_eq!(failure, RenderFailure::Renderer("Bad template".to_string()));
        assert_eq!(failure.to_string(), "Bad template");
        assert!(!fixture.work("score.json").exists());
        assert!(!fixture.public(&fixture.artifact("mp3")).exists());
    }

    #[tokio::test]
    async fn test_exit_zero_without_completion_fails() {
        let fixture = Fixture::new(RENDER_SILENT, TRANSCODE_OK);
        let failure = fixture.render().await.unwrap_err();

        assert_eq!(failure, RenderFailure::MissingCompletion);
        // The transcoder never ran
        assert!(!fixture.public(&fixture.artifact("mp3")).exists());
        assert!(!fixture.work(&fixture.artifact("wav")).exists());
    }

    #[tokio::test]
    async fn test_renderer_timeout() {
        let fixture = Fixture::new(RENDER_HANG, TRANSCODE_OK);
        let failure = fixture.render().await.unwrap_err();

        assert!(matches!(
            failure,
            RenderFailure::TimedOut {
                stage: "renderer",
                ..
            }
        ));
        assert!(!fixture.work("score.json").exists());
    }

    #[tokio::test]
    async fn test_transcoder_failure_after_render() {
        let fixture = Fixture::new(RENDER_OK, TRANSCODE_FAIL);
        let failure = fixture.render().await.unwrap_err();

        assert_eq!(
            failure,
            RenderFailure::Transcoder("sh exited with code 2".to_string())
        );
        // Lossless render and partial transcode are both removed
        assert!(!fixture.work(&fixture.artifact("wav")).exists());
        assert!(!fixture.public(&fixture.artifact("mp3")).exists());
        assert!(!fixture.public(&fixture.artifact("wav")).exists());
    }

    #[tokio::test]
    async fn test_input_with_wrong_extension_is_kept() {
        let mut fixture = Fixture::new(RENDER_OK, TRANSCODE_OK);
        std::fs::write(fixture.work("score.txt"), b"{}").unwrap();
        fixture.job.input_file = "score.txt".to_string();

        fixture.render().await.unwrap();
        assert!(fixture.work("score.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_job_keeps_earlier_job_output() {
        let fixture = Fixture::new(RENDER_OK, TRANSCODE_OK);
        fixture.render().await.unwrap();

        // Same task name and target, but the transcoder fails this time
        let root = fixture.settings.work_dir.parent().unwrap().to_path_buf();
        let failing = write_script(&root, "transcode-fail.sh", TRANSCODE_FAIL);
        let settings = RenderSettings {
            transcoder: ToolCommand::new("sh").arg(failing),
            ..fixture.settings.clone()
        };
        let second = Job {
            id: Uuid::new_v4(),
            ..fixture.job.clone()
        };
        let task = RenderTask {
            job_id: second.id,
            ..fixture.task.clone()
        };
        std::fs::write(fixture.work("score.json"), b"{}").unwrap();

        let failure = StandardRenderService::new(settings)
            .render(&task, &second)
            .await
            .unwrap_err();
        assert!(matches!(failure, RenderFailure::Transcoder(_)));

        assert!(fixture.public(&fixture.artifact("mp3")).exists());
        assert!(fixture.public(&fixture.artifact("wav")).exists());
        let second_mp3 = format!("nocturne-take-{}.mp3", second.id.simple());
        assert!(!fixture.public(&second_mp3).exists());
    }

    #[tokio::test]
    async fn test_discard_removes_partial_render() {
        let fixture = Fixture::new(RENDER_OK, TRANSCODE_OK);
        std::fs::create_dir_all(&fixture.settings.public_dir).unwrap();
        std::fs::write(fixture.work(&fixture.artifact("wav")), b"RI").unwrap();
        std::fs::write(fixture.public(&fixture.artifact("mp3")), b"ID3").unwrap();
        std::fs::write(fixture.work("unrelated.wav"), b"RIFF").unwrap();

        StandardRenderService::new(fixture.settings.clone())
            .discard(&fixture.task, &fixture.job)
            .await;

        assert!(!fixture.work("score.json").exists());
        assert!(!fixture.work(&fixture.artifact("wav")).exists());
        assert!(!fixture.public(&fixture.artifact("mp3")).exists());
        assert!(fixture.work("unrelated.wav").exists());
    }
}
