//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod health;
mod job;
mod score;

pub use job::JobCommands;
pub use score::ScoreCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Score checks
    Score {
        #[command(subcommand)]
        command: ScoreCommands,
    },
    /// Job inspection
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Check that the job store is reachable
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Score { command } => score::handle_score_command(command),
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Health => health::check_health(config).await,
    }
}
