//! Performance service DTOs

use serde::{Deserialize, Serialize};

/// Update sent to a performance resource once its audio is available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceUpdate {
    /// Always "satisfied"
    pub status: String,
    /// Public URL of the compressed artifact
    pub url: String,
}

impl PerformanceUpdate {
    pub fn satisfied(url: impl Into<String>) -> Self {
        Self {
            status: "satisfied".to_string(),
            url: url.into(),
        }
    }
}
