//! Performance service client
//!
//! The performance service owns the resources users listen to. The worker
//! tells it where the finished audio lives once a render is satisfied.

use crate::error::Result;
use crate::handle_empty_response;
use cantor_core::dto::performance::PerformanceUpdate;
use reqwest::Client;
use uuid::Uuid;

/// HTTP client for the performance service
#[derive(Debug, Clone)]
pub struct PerformanceClient {
    base_url: String,
    client: Client,
}

impl PerformanceClient {
    /// Create a new performance service client
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL of the performance service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Mark a performance as satisfied by the audio at `url`
    ///
    /// # Arguments
    /// * `performance_id` - The performance to update
    /// * `url` - Public URL of the compressed artifact
    pub async fn mark_satisfied(&self, performance_id: Uuid, url: &str) -> Result<()> {
        let endpoint = format!("{}/api/performances/{}", self.base_url, performance_id);
        let response = self
            .client
            .put(&endpoint)
            .json(&PerformanceUpdate::satisfied(url))
            .send()
            .await?;

        handle_empty_response(response).await
    }
}
