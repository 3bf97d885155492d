//! Render scheduler
//!
//! Polls the job store for pending jobs and renders them one at a time.
//! The render itself runs on a spawned task and reports back over a channel;
//! everything else happens inside the scheduler's own control loop, which is
//! the only place the run guard is read or written.

use anyhow::Result;
use cantor_core::domain::job::{Job, JobStatus};
use cantor_core::domain::task::RenderTask;
use cantor_core::dto::job::UpdateStatusRequest;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::execution::{RenderedArtifacts, RunOutcome};
use crate::repository::{JobStore, PerformanceNotifier};
use crate::scheduler::guard::{ActiveRun, RunGuard};
use crate::scheduler::settle::Settlement;
use crate::service::RenderService;

/// Sent by a render task once it has settled its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFinished {
    pub job_id: Uuid,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to pick up, or the store could not be reached
    Idle,
    /// A render is in flight and within its budget
    Busy(Uuid),
    /// A job was picked and its render started
    Started(Uuid),
    /// A job was marked started but its task could not be found
    Abandoned(Uuid),
    /// The watchdog failed the running job
    Expired(Uuid),
}

/// Scheduler that picks pending jobs and drives them to a terminal status
pub struct RenderScheduler {
    poll_interval: Duration,
    max_render_time: Duration,
    store: Arc<dyn JobStore>,
    notifier: Arc<dyn PerformanceNotifier>,
    renderer: Arc<dyn RenderService>,
    guard: RunGuard,
    finished_tx: mpsc::UnboundedSender<RunFinished>,
    finished_rx: mpsc::UnboundedReceiver<RunFinished>,
}

impl RenderScheduler {
    /// Creates a new scheduler
    pub fn new(
        config: &Config,
        store: Arc<dyn JobStore>,
        notifier: Arc<dyn PerformanceNotifier>,
        renderer: Arc<dyn RenderService>,
    ) -> Self {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        Self {
            poll_interval: config.poll_interval,
            max_render_time: config.max_render_time,
            store,
            notifier,
            renderer,
            guard: RunGuard::new(),
            finished_tx,
            finished_rx,
        }
    }

    /// Job currently being rendered, if any
    pub fn running_job(&self) -> Option<Uuid> {
        self.guard.job_id()
    }

    /// Runs the scheduler until `shutdown` completes
    ///
    /// Ticks on the poll interval, and again right away whenever a run is
    /// resolved so queued work does not wait for the timer.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting render scheduler (interval: {:?}, render budget: {:?})",
            self.poll_interval, self.max_render_time
        );

        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    match self.running_job() {
                        Some(job_id) => info!("Shutdown requested, interrupting job {}", job_id),
                        None => info!("Shutdown requested, stopping scheduler"),
                    }
                    self.shutdown().await;
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.drive().await;
                }
                Some(finished) = self.next_finished() => {
                    if self.complete(finished).await.is_some() {
                        self.drive().await;
                    }
                }
            }
        }
    }

    /// Ticks until the scheduler settles into a state that waits on the timer
    async fn drive(&mut self) {
        while let Tick::Expired(job_id) = self.tick().await {
            debug!("Re-ticking after expiring job {}", job_id);
        }
    }

    /// Performs a single scheduling step
    pub async fn tick(&mut self) -> Tick {
        if let Some(job_id) = self.guard.job_id() {
            if self.guard.is_expired(self.max_render_time) {
                return self.expire().await;
            }
            debug!("Job {} still rendering", job_id);
            return Tick::Busy(job_id);
        }

        self.pick().await
    }

    /// Waits for the next render task to report back
    pub async fn next_finished(&mut self) -> Option<RunFinished> {
        self.finished_rx.recv().await
    }

    /// Resolves the run a completion event belongs to
    ///
    /// Returns the resolved job, or `None` when the event is for a run the
    /// watchdog already resolved.
    pub async fn complete(&mut self, finished: RunFinished) -> Option<Uuid> {
        if self.guard.job_id() != Some(finished.job_id) {
            warn!(
                "Dropping completion for job {}: run was already resolved",
                finished.job_id
            );
            return None;
        }

        let run = self.guard.release()?;
        self.resolve(run).await;
        Some(finished.job_id)
    }

    /// Fails the in-flight render, if any, and empties the guard
    pub async fn shutdown(&mut self) {
        let Some(run) = self.guard.current() else {
            return;
        };

        let interrupted = run.settlement.settle(RunOutcome::Interrupted).is_ok();
        if !interrupted {
            debug!(
                "Job {} settled before shutdown, recording its outcome",
                run.job.id
            );
        }

        if let Some(mut run) = self.guard.release() {
            run.cancel().await;
            // A settled render has already cleaned up after itself
            if interrupted {
                self.renderer.discard(&run.task, &run.job).await;
            }
            self.resolve(run).await;
        }
    }

    async fn expire(&mut self) -> Tick {
        let Some(run) = self.guard.current() else {
            return Tick::Idle;
        };
        let job_id = run.job.id;

        if run
            .settlement
            .settle(RunOutcome::Expired(self.max_render_time))
            .is_err()
        {
            // The render settled first; its completion event resolves the run
            debug!("Job {} settled before the watchdog fired", job_id);
            return Tick::Busy(job_id);
        }

        warn!(
            "Job {} exceeded the render budget of {:?}, aborting",
            job_id, self.max_render_time
        );

        if let Some(mut run) = self.guard.release() {
            run.cancel().await;
            self.renderer.discard(&run.task, &run.job).await;
            self.resolve(run).await;
        }

        Tick::Expired(job_id)
    }

    async fn pick(&mut self) -> Tick {
        let job = match self.store.find_next_pending().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("No pending jobs");
                return Tick::Idle;
            }
            Err(e) => {
                warn!("Error fetching next pending job: {:#}", e);
                return Tick::Idle;
            }
        };

        let job_id = job.id;
        info!("Picked job {} ({})", job_id, job.input_file);

        let job = match self
            .store
            .update_status(job_id, UpdateStatusRequest::new(JobStatus::Started))
            .await
        {
            Ok(job) => job,
            Err(e) => {
                warn!("Failed to start job {}: {:#}", job_id, e);
                return Tick::Idle;
            }
        };

        let task = match self.store.find_task_by_job_id(job_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                error!("Job {} has no render task, leaving it started", job_id);
                return Tick::Abandoned(job_id);
            }
            Err(e) => {
                error!(
                    "Task lookup for job {} failed, leaving it started: {:#}",
                    job_id, e
                );
                return Tick::Abandoned(job_id);
            }
        };

        self.start_run(job, task);
        Tick::Started(job_id)
    }

    fn start_run(&mut self, job: Job, task: RenderTask) {
        let settlement = Arc::new(Settlement::new());

        let handle = {
            let renderer = Arc::clone(&self.renderer);
            let settlement = Arc::clone(&settlement);
            let finished = self.finished_tx.clone();
            let job = job.clone();
            let task = task.clone();

            tokio::spawn(async move {
                let outcome = match renderer.render(&task, &job).await {
                    Ok(artifacts) => RunOutcome::Rendered(artifacts),
                    Err(failure) => RunOutcome::Failed(failure),
                };

                if settlement.settle(outcome).is_err() {
                    debug!("Render of job {} finished after its run was resolved", job.id);
                    return;
                }

                if finished.send(RunFinished { job_id: job.id }).is_err() {
                    warn!("Scheduler gone before job {} was reported", job.id);
                }
            })
        };

        info!("Rendering job {} as task '{}'", job.id, task.name);

        if let Err(run) = self.guard.occupy(ActiveRun::new(job, task, settlement, handle)) {
            error!("Run guard already occupied, dropping job {}", run.job.id);
            run.abort();
        }
    }

    /// Writes a settled run's outcome to the store
    async fn resolve(&self, run: ActiveRun) {
        let job_id = run.job.id;

        let Some(outcome) = run.settlement.get() else {
            error!("Run for job {} released without an outcome", job_id);
            return;
        };

        if let RunOutcome::Rendered(artifacts) = outcome {
            self.satisfy(&run, artifacts).await;
            return;
        }

        let update = outcome.status_update();
        let reason = update.reason.clone().unwrap_or_default();
        match self.store.update_status(job_id, update).await {
            Ok(_) => info!("Job {} failed: {}", job_id, reason),
            Err(e) => error!("Failed to mark job {} failed: {:#}", job_id, e),
        }
    }

    async fn satisfy(&self, run: &ActiveRun, artifacts: &RenderedArtifacts) {
        let job_id = run.job.id;

        if let Err(e) = self
            .store
            .update_status(job_id, UpdateStatusRequest::new(JobStatus::Satisfied))
            .await
        {
            error!("Failed to mark job {} satisfied: {:#}", job_id, e);
            return;
        }

        info!("Job {} satisfied", job_id);

        for recording in artifacts.recordings() {
            if let Err(e) = self.store.create_recording(recording.clone()).await {
                error!(
                    "Failed to record {} artifact for job {}: {:#}",
                    recording.format, job_id, e
                );
            }
        }

        let notifier = Arc::clone(&self.notifier);
        let performance_id = run.task.performance_id;
        let url = artifacts.public_url().to_string();

        tokio::spawn(async move {
            match notifier.notify_satisfied(performance_id, &url).await {
                Ok(()) => debug!("Notified performance {} of {}", performance_id, url),
                Err(e) => warn!("{:#}", e),
            }
        });
    }
}
