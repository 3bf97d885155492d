//! Job-related API endpoints

use crate::StoreClient;
use crate::error::Result;
use crate::{handle_optional_response, handle_response};
use cantor_core::domain::job::Job;
use cantor_core::domain::task::RenderTask;
use cantor_core::dto::job::UpdateStatusRequest;
use tracing::debug;
use uuid::Uuid;

impl StoreClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Fetch the next pending job, if any
    ///
    /// The store decides the ordering; it currently hands out the most
    /// recently created pending job first.
    ///
    /// # Returns
    /// `None` when no job is waiting
    pub async fn find_next_pending(&self) -> Result<Option<Job>> {
        let url = format!("{}/api/render-jobs/pending/next", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_optional_response(response).await
    }

    /// Get a job by ID
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let url = format!("{}/api/render-jobs/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// List all jobs
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let url = format!("{}/api/render-jobs", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// Update the status of a job
    ///
    /// # Arguments
    /// * `job_id` - The ID of the job to update
    /// * `update` - The new status and optional reason
    ///
    /// # Returns
    /// The job as stored after the update
    pub async fn update_job_status(&self, job_id: Uuid, update: &UpdateStatusRequest) -> Result<Job> {
        let url = format!("{}/api/render-jobs/{}/status", self.base_url, job_id);
        debug!("Setting job {} to {}", job_id, update.status);

        let response = self.client.put(&url).json(update).send().await?;

        handle_response(response).await
    }

    // =============================================================================
    // Render Tasks
    // =============================================================================

    /// Look up the render task attached to a job
    ///
    /// # Returns
    /// `None` when the job has no task
    pub async fn find_task_by_job_id(&self, job_id: Uuid) -> Result<Option<RenderTask>> {
        let url = format!("{}/api/render-jobs/{}/task", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        handle_optional_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantor_core::domain::job::JobStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job_json(id: Uuid, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "input_file": "score.json",
            "out_file": "take-one",
            "status": status,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_find_next_pending() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/api/render-jobs/pending/next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_json(id, "pending")))
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri());
        let job = client.find_next_pending().await.unwrap().unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.out_file, "take-one");
    }

    #[tokio::test]
    async fn test_find_next_pending_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/render-jobs/pending/next"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri());
        assert!(client.find_next_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_next_pending_server_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/render-jobs/pending/next"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri());
        let err = client.find_next_pending().await.unwrap_err();
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn test_update_job_status_sends_reason() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("PUT"))
            .and(path(format!("/api/render-jobs/{}/status", id)))
            .and(body_json(json!({ "status": "failed", "reason": "Bad template" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_json(id, "failed")))
            .expect(1)
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri());
        let update = UpdateStatusRequest::new(JobStatus::Failed).with_reason("Bad template");
        let job = client.update_job_status(id, &update).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_find_task_by_job_id() {
        let server = MockServer::start().await;
        let job_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let performance_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/api/render-jobs/{}/task", job_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": task_id,
                "name": "nocturne",
                "performance_id": performance_id,
                "job_id": job_id
            })))
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri());
        let task = client.find_task_by_job_id(job_id).await.unwrap().unwrap();
        assert_eq!(task.id, task_id);
        assert_eq!(task.name, "nocturne");
        assert_eq!(task.performance_id, performance_id);
    }

    #[tokio::test]
    async fn test_malformed_job_is_parse_error() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/api/render-jobs/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri());
        let err = client.get_job(id).await.unwrap_err();
        assert!(matches!(err, crate::ClientError::ParseError(_)));
    }
}
