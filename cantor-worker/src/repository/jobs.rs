//! Job store repository
//!
//! Handles communication with the job store for job-related operations:
//! - Fetching the next pending job
//! - Updating job status
//! - Looking up a job's render task
//! - Appending recordings

use anyhow::{Context, Result};
use async_trait::async_trait;
use cantor_client::StoreClient;
use cantor_core::domain::job::Job;
use cantor_core::domain::recording::Recording;
use cantor_core::domain::task::RenderTask;
use cantor_core::dto::job::UpdateStatusRequest;
use cantor_core::dto::recording::CreateRecording;
use uuid::Uuid;

/// Repository trait for the job store
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetches the next pending job, if any
    async fn find_next_pending(&self) -> Result<Option<Job>>;

    /// Updates the job status
    ///
    /// # Arguments
    /// * `job_id` - The ID of the job to update
    /// * `update` - The new status and optional reason
    async fn update_status(&self, job_id: Uuid, update: UpdateStatusRequest) -> Result<Job>;

    /// Looks up the render task attached to a job
    async fn find_task_by_job_id(&self, job_id: Uuid) -> Result<Option<RenderTask>>;

    /// Appends a recording
    async fn create_recording(&self, recording: CreateRecording) -> Result<Recording>;
}

/// HTTP implementation of JobStore
pub struct HttpJobStore {
    client: StoreClient,
}

impl HttpJobStore {
    /// Creates a new HTTP job store
    ///
    /// # Arguments
    /// * `client` - Client pointed at the job store
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobStore for HttpJobStore {
    async fn find_next_pending(&self) -> Result<Option<Job>> {
        self.client
            .find_next_pending()
            .await
            .context("Failed to fetch next pending job")
    }

    async fn update_status(&self, job_id: Uuid, update: UpdateStatusRequest) -> Result<Job> {
        self.client
            .update_job_status(job_id, &update)
            .await
            .with_context(|| format!("Failed to set job {} to {}", job_id, update.status))
    }

    async fn find_task_by_job_id(&self, job_id: Uuid) -> Result<Option<RenderTask>> {
        self.client
            .find_task_by_job_id(job_id)
            .await
            .with_context(|| format!("Failed to look up task for job {}", job_id))
    }

    async fn create_recording(&self, recording: CreateRecording) -> Result<Recording> {
        self.client
            .create_recording(&recording)
            .await
            .context("Failed to create recording")
    }
}
