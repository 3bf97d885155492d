//! Configuration module
//!
//! Handles CLI configuration shared by every command.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the job store
    pub store_url: String,
}
