//! Artifact paths and cleanup
//!
//! A render touches three files: the temporary input document, the lossless
//! render in the scratch directory, and the compressed transcode in the
//! public directory. Deletions are extension-checked so a path construction
//! bug cannot remove an unrelated file.

use cantor_core::domain::job::Job;
use cantor_core::domain::recording::AudioFormat;
use cantor_core::domain::task::RenderTask;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::RenderSettings;

/// Kind of file a render works with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The score handed to the renderer
    Input,
    /// High resolution render
    Lossless,
    /// Transcoded render
    Compressed,
}

impl ArtifactKind {
    /// The only extension a file of this kind may have
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Input => "json",
            ArtifactKind::Lossless => AudioFormat::Wav.extension(),
            ArtifactKind::Compressed => AudioFormat::Mp3.extension(),
        }
    }

    pub fn matches(self, path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some(self.extension())
    }
}

/// Every path one render reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Base name shared by all produced files
    pub stem: String,
    pub input: PathBuf,
    /// Lossless render in the scratch directory
    pub lossless: PathBuf,
    /// Compressed render in the public directory
    pub compressed: PathBuf,
    /// Public copy of the lossless render
    pub published_lossless: PathBuf,
}

impl ArtifactPaths {
    /// Resolves paths for a job
    ///
    /// Relative input references are looked up in the work directory.
    pub fn resolve(settings: &RenderSettings, task: &RenderTask, job: &Job) -> Self {
        let stem = artifact_stem(task, job);

        let input = Path::new(&job.input_file);
        let input = if input.is_absolute() {
            input.to_path_buf()
        } else {
            settings.work_dir.join(input)
        };

        Self {
            input,
            lossless: settings.work_dir.join(format!("{}.wav", stem)),
            compressed: settings.public_dir.join(format!("{}.mp3", stem)),
            published_lossless: settings.public_dir.join(format!("{}.wav", stem)),
            stem,
        }
    }

    /// URL under which a file in the public directory is served
    pub fn public_url(base_url: &str, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", base_url.trim_end_matches('/'), name)
    }
}

/// `<task>-<target>-<job id>`, skipping parts that sanitize to nothing
///
/// The job id keeps two jobs with the same task and target from sharing
/// public files.
fn artifact_stem(task: &RenderTask, job: &Job) -> String {
    let name = sanitize(&task.name);
    let target = Path::new(&job.out_file)
        .file_stem()
        .map(|stem| sanitize(&stem.to_string_lossy()))
        .unwrap_or_default();
    let id = job.id.simple().to_string();

    [name, target, id]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Keeps ASCII alphanumerics, `-` and `_`; anything else becomes `-`
fn sanitize(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    replaced.trim_matches('-').to_string()
}

/// Result of one deletion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    Removed,
    /// Nothing to delete
    Missing,
    /// Extension did not match the artifact kind
    Refused,
    Failed,
}

/// Deletes an artifact, logging instead of failing
pub async fn remove_artifact(path: &Path, kind: ArtifactKind) -> Cleanup {
    if !kind.matches(path) {
        error!(
            "Refusing to delete {}: expected a .{} file for {:?} artifact",
            path.display(),
            kind.extension(),
            kind
        );
        return Cleanup::Refused;
    }

    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("Removed {}", path.display());
            Cleanup::Removed
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Nothing to remove at {}", path.display());
            Cleanup::Missing
        }
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            Cleanup::Failed
        }
    }
}
