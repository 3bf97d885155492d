//! Performance notifier
//!
//! Tells the performance service where the finished audio of a performance
//! lives. Delivery is best-effort: callers log failures and move on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cantor_client::PerformanceClient;
use uuid::Uuid;

/// Repository trait for downstream notifications
#[async_trait]
pub trait PerformanceNotifier: Send + Sync {
    /// Reports a performance as satisfied by the audio at `url`
    async fn notify_satisfied(&self, performance_id: Uuid, url: &str) -> Result<()>;
}

/// HTTP implementation of PerformanceNotifier
pub struct HttpPerformanceNotifier {
    client: PerformanceClient,
}

impl HttpPerformanceNotifier {
    /// Creates a new HTTP notifier
    pub fn new(client: PerformanceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PerformanceNotifier for HttpPerformanceNotifier {
    async fn notify_satisfied(&self, performance_id: Uuid, url: &str) -> Result<()> {
        self.client
            .mark_satisfied(performance_id, url)
            .await
            .with_context(|| format!("Failed to notify performance {}", performance_id))
    }
}
