//! Health command handler

use anyhow::Result;
use cantor_client::StoreClient;
use colored::*;

use crate::config::Config;

/// Pings the job store and reports the result
pub async fn check_health(config: &Config) -> Result<()> {
    let client = StoreClient::new(config.store_url.clone());

    match client.health().await {
        Ok(()) => {
            println!(
                "{} {}",
                "✓ Job store reachable at".green().bold(),
                client.base_url().cyan()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "{} {}",
                "✗ Job store unreachable at".red().bold(),
                client.base_url().cyan()
            );
            Err(e.into())
        }
    }
}
