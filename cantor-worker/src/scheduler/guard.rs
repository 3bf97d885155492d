//! Run guard
//!
//! The single slot holding the render currently in flight. The scheduler
//! owns the guard outright and only touches it from its own control loop,
//! which is what keeps renders mutually exclusive.

use cantor_core::domain::job::Job;
use cantor_core::domain::task::RenderTask;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::execution::RunOutcome;
use crate::scheduler::settle::Settlement;

/// A render in flight
pub struct ActiveRun {
    pub job: Job,
    pub task: RenderTask,
    /// When the run was last known to be healthy
    pub last_refresh: Instant,
    /// Shared with the render task
    pub settlement: Arc<Settlement<RunOutcome>>,
    handle: JoinHandle<()>,
}

impl ActiveRun {
    pub fn new(
        job: Job,
        task: RenderTask,
        settlement: Arc<Settlement<RunOutcome>>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            job,
            task,
            last_refresh: Instant::now(),
            settlement,
            handle,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.last_refresh.elapsed()
    }

    /// Cancels the render task
    ///
    /// Child processes are spawned with kill-on-drop, so cancelling the task
    /// kills whatever it is running.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Aborts the render task and waits until it has stopped
    ///
    /// Once this returns the renderer's processes are killed and nothing
    /// more is written on behalf of the run. Call at most once.
    pub async fn cancel(&mut self) {
        self.handle.abort();
        match (&mut self.handle).await {
            Ok(()) => debug!("Render of job {} had already returned", self.job.id),
            Err(e) if e.is_cancelled() => debug!("Render of job {} cancelled", self.job.id),
            Err(e) => warn!("Render of job {} ended abnormally: {}", self.job.id, e),
        }
    }
}

/// Holds at most one [`ActiveRun`]
#[derive(Default)]
pub struct RunGuard {
    slot: Option<ActiveRun>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_id(&self) -> Option<Uuid> {
        self.slot.as_ref().map(|run| run.job.id)
    }

    pub fn current(&self) -> Option<&ActiveRun> {
        self.slot.as_ref()
    }

    /// Places a run in the slot
    ///
    /// Hands the run back if the slot is already taken.
    pub fn occupy(&mut self, run: ActiveRun) -> Result<(), ActiveRun> {
        if self.slot.is_some() {
            return Err(run);
        }
        self.slot = Some(run);
        Ok(())
    }

    /// Empties the slot
    pub fn release(&mut self) -> Option<ActiveRun> {
        self.slot.take()
    }

    /// True when a run is held and older than `budget`
    pub fn is_expired(&self, budget: Duration) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|run| run.elapsed() > budget)
    }
}
