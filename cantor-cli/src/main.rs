//! Cantor CLI
//!
//! Command-line interface for inspecting the Cantor job store and checking
//! scores before they are submitted for rendering.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "cantor")]
#[command(about = "Cantor render pipeline CLI", long_about = None)]
struct Cli {
    /// Job store URL
    #[arg(long, env = "CANTOR_STORE_URL", default_value = "http://localhost:8080")]
    store_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        store_url: cli.store_url,
    };

    handle_command(cli.command, &config).await
}
