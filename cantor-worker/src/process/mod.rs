//! Process runner
//!
//! Spawns an external program, captures its output line by line and enforces
//! a hard wall-clock limit. Used for both the renderer and the transcoder.
//!
//! Each run resolves exactly once. Output that arrives after a run has
//! resolved (for example from a process that ignored the kill for a moment)
//! is logged and dropped.

pub mod markers;

use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// How long output may stay open after the process itself has exited
const READER_GRACE: Duration = Duration::from_millis(500);

/// Outcome of a single process run
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// Exited with code 0, or without any exit code
    Success {
        stdout: Vec<String>,
        stderr: Vec<String>,
    },
    /// Exited with a non-zero code or could not be spawned
    Failure {
        exit_code: Option<i32>,
        error: String,
        stdout: Vec<String>,
        stderr: Vec<String>,
    },
    /// Still running when the limit expired; a kill was sent
    TimedOut { after: Duration },
}

/// Runs external programs with a time limit
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Token marking error payloads on stderr
    error_marker: String,
}

impl ProcessRunner {
    pub fn new(error_marker: impl Into<String>) -> Self {
        Self {
            error_marker: error_marker.into(),
        }
    }

    /// Runs `program` with `args`, killing it after `max_run`
    ///
    /// The timeout is reported as soon as it fires. The kill is sent but its
    /// effect is not awaited, so the process may outlive the returned outcome
    /// briefly. The limit covers the process itself; output still open after
    /// it exits is drained for a short grace period and then cut off.
    pub async fn run(&self, program: &str, args: &[String], max_run: Duration) -> ProcessOutcome {
        debug!("Spawning {} {:?}", program, args);

        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to spawn {}: {}", program, e);
                return ProcessOutcome::Failure {
                    exit_code: None,
                    error: format!("Failed to spawn {}: {}", program, e),
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                };
            }
        };

        let resolved = Arc::new(AtomicBool::new(false));
        let stdout_lines = Arc::new(Mutex::new(Vec::new()));
        let stderr_lines = Arc::new(Mutex::new(Vec::new()));

        let stdout_task = spawn_reader(
            child.stdout.take(),
            LineSink {
                program: program.to_string(),
                error_marker: None,
                resolved: Arc::clone(&resolved),
                lines: Arc::clone(&stdout_lines),
            },
        );
        let stderr_task = spawn_reader(
            child.stderr.take(),
            LineSink {
                program: program.to_string(),
                error_marker: Some(self.error_marker.clone()),
                resolved: Arc::clone(&resolved),
                lines: Arc::clone(&stderr_lines),
            },
        );

        let status = match tokio::time::timeout(max_run, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                resolved.store(true, Ordering::SeqCst);
                warn!("{} still running after {:?}, killing it", program, max_run);
                if let Err(e) = child.start_kill() {
                    debug!("Kill of {} skipped: {}", program, e);
                }
                return ProcessOutcome::TimedOut { after: max_run };
            }
        };

        // A process left behind by the child may still hold the pipes open
        tokio::join!(
            drain(stdout_task, program),
            drain(stderr_task, program)
        );
        resolved.store(true, Ordering::SeqCst);

        let stdout = take_lines(&stdout_lines);
        let stderr = take_lines(&stderr_lines);

        match status {
            Ok(status) => match status.code() {
                // No code means the process was ended by a signal; the caller's
                // own output checks decide whether that counts.
                Some(0) | None => {
                    debug!("{} exited with {}", program, status);
                    ProcessOutcome::Success { stdout, stderr }
                }
                Some(code) => {
                    let error = markers::error_reason(&stderr, &self.error_marker)
                        .unwrap_or_else(|| format!("{} exited with code {}", program, code));
                    warn!("{} failed with code {}: {}", program, code, error);
                    ProcessOutcome::Failure {
                        exit_code: Some(code),
                        error,
                        stdout,
                        stderr,
                    }
                }
            },
            Err(e) => {
                error!("Failed to wait for {}: {}", program, e);
                ProcessOutcome::Failure {
                    exit_code: None,
                    error: format!("Failed to wait for {}: {}", program, e),
                    stdout,
                    stderr,
                }
            }
        }
    }
}

/// Where a reader task sends its lines
struct LineSink {
    program: String,
    error_marker: Option<String>,
    resolved: Arc<AtomicBool>,
    lines: Arc<Mutex<Vec<String>>>,
}

fn spawn_reader<R>(reader: Option<R>, sink: LineSink) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    reader.map(|reader| tokio::spawn(read_lines(reader, sink)))
}

async fn read_lines<R>(reader: R, sink: LineSink)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if sink.resolved.load(Ordering::SeqCst) {
                    debug!(
                        "Ignoring output from {} after its run resolved: {}",
                        sink.program, line
                    );
                    continue;
                }

                if let Some(marker) = &sink.error_marker {
                    if let Some(reason) = markers::payload(&line, marker) {
                        error!("{} reported an error: {}", sink.program, reason);
                    }
                }

                sink.lines
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read output of {}: {}", sink.program, e);
                break;
            }
        }
    }
}

/// Waits for a reader to hit end of output, detaching it after a grace period
async fn drain(task: Option<JoinHandle<()>>, program: &str) {
    let Some(mut handle) = task else {
        return;
    };

    match tokio::time::timeout(READER_GRACE, &mut handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Output reader for {} panicked: {}", program, e),
        Err(_) => {
            debug!(
                "Output of {} still open {:?} after exit, keeping what was read",
                program, READER_GRACE
            );
            handle.abort();
        }
    }
}

fn take_lines(lines: &Mutex<Vec<String>>) -> Vec<String> {
    std::mem::take(&mut *lines.lock().unwrap_or_else(PoisonError::into_inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_success_captures_output() {
        let runner = ProcessRunner::new("xsynxerror");
        let outcome = runner
            .run(
                "sh",
                &sh("echo one; echo 'xsynx completed xsynx'; echo warn >&2"),
                Duration::from_secs(5),
            )
            .await;

        let ProcessOutcome::Success { stdout, stderr } = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(stdout, vec!["one", "xsynx completed xsynx"]);
        assert_eq!(stderr, vec!["warn"]);
    }

    #[tokio::test]
    async fn test_failure_uses_error_markers() {
        let runner = ProcessRunner::new("xsynxerror");
        let outcome = runner
            .run(
                "sh",
                &sh("echo 'xsynxerror Bad template xsynxerror' >&2; echo 'xsynxerror Missing sample' >&2; exit 1"),
                Duration::from_secs(5),
            )
            .await;

        let ProcessOutcome::Failure {
            exit_code, error, ..
        } = outcome
        else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(exit_code, Some(1));
        assert_eq!(error, "Bad template,Missing sample");
    }

    #[tokio::test]
    async fn test_failure_without_markers() {
        let runner = ProcessRunner::new("xsynxerror");
        let outcome = runner
            .run("sh", &sh("echo oops >&2; exit 3"), Duration::from_secs(5))
            .await;

        let ProcessOutcome::Failure {
            exit_code, error, ..
        } = outcome
        else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(exit_code, Some(3));
        assert_eq!(error, "sh exited with code 3");
    }

    #[tokio::test]
    async fn test_error_marker_alone_does_not_fail_run() {
        let runner = ProcessRunner::new("xsynxerror");
        let outcome = runner
            .run(
                "sh",
                &sh("echo 'xsynxerror recoverable xsynxerror' >&2; exit 0"),
                Duration::from_secs(5),
            )
            .await;

        assert!(matches!(outcome, ProcessOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_timeout_reports_promptly() {
        let runner = ProcessRunner::new("xsynxerror");
        let started = Instant::now();
        let outcome = runner
            .run("sh", &sh("sleep 10"), Duration::from_millis(200))
            .await;

        assert!(matches!(
            outcome,
            ProcessOutcome::TimedOut { after } if after == Duration::from_millis(200)
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let runner = ProcessRunner::new("xsynxerror");

        let outcome = runner
            .run(
                "sh",
                &sh(&format!("sleep 1; touch '{}'", marker.display())),
                Duration::from_millis(200),
            )
            .await;
        assert!(matches!(outcome, ProcessOutcome::TimedOut { .. }));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_exit_not_held_up_by_background_output() {
        let runner = ProcessRunner::new("xsynxerror");
        let started = Instant::now();
        let outcome = runner
            .run(
                "sh",
                &sh("echo 'xsynx completed xsynx'; sleep 5 &"),
                Duration::from_secs(3),
            )
            .await;

        let ProcessOutcome::Success { stdout, .. } = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(stdout, vec!["xsynx completed xsynx"]);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_signal_exit_counts_as_success() {
        let runner = ProcessRunner::new("xsynxerror");
        let outcome = runner
            .run("sh", &sh("kill -9 $$"), Duration::from_secs(5))
            .await;

        assert!(matches!(outcome, ProcessOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let runner = ProcessRunner::new("xsynxerror");
        let outcome = runner
            .run(
                "/nonexistent/cantor-renderer",
                &[],
                Duration::from_secs(1),
            )
            .await;

        let ProcessOutcome::Failure {
            exit_code, error, ..
        } = outcome
        else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(exit_code, None);
        assert!(error.starts_with("Failed to spawn /nonexistent/cantor-renderer"));
    }
}
