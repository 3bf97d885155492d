//! Cantor HTTP Client
//!
//! A simple, type-safe HTTP client for the services the render worker talks to:
//! the job store (jobs, tasks, recordings) and the performance service that is
//! notified when a render is available.
//!
//! # Example
//!
//! ```no_run
//! use cantor_client::StoreClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = StoreClient::new("http://localhost:8080");
//!
//!     if let Some(job) = client.find_next_pending().await? {
//!         println!("Next job: {}", job.id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod performances;
mod recordings;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use performances::PerformanceClient;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the job store API
///
/// Methods are organized into logical groups:
/// - Job lifecycle (next pending, status updates, listing)
/// - Render task lookup
/// - Recording creation
#[derive(Debug, Clone)]
pub struct StoreClient {
    /// Base URL of the job store (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl StoreClient {
    /// Create a new job store client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the job store API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use cantor_client::StoreClient;
    ///
    /// let client = StoreClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new job store client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the job store API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the job store
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the job store is reachable
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_empty_response(response).await
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
///
/// Checks the status code and returns an appropriate error if the request
/// failed, or deserializes the response body if successful.
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::from_status(status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Handle an API response where 404 means "nothing there"
pub(crate) async fn handle_optional_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Option<T>> {
    match handle_response(response).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Handle an API response whose body is ignored
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::from_status(status, &body));
    }

    Ok(())
}
