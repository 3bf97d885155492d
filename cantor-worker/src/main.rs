//! Cantor Worker
//!
//! A stateless worker that turns pending render jobs into published audio.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Repositories: HTTP communication with the job store and performance service
//! - Services: Business logic (rendering, transcoding, artifact cleanup)
//! - Scheduler: Job polling, the run guard and the render watchdog
//!
//! The worker polls the job store for the next pending job, renders it with
//! an external synthesizer, transcodes the result and records both artifacts.

mod config;
mod execution;
mod process;
mod repository;
mod scheduler;
mod service;

use anyhow::Result;
use cantor_client::{PerformanceClient, StoreClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{HttpJobStore, HttpPerformanceNotifier, JobStore, PerformanceNotifier};
use crate::scheduler::RenderScheduler;
use crate::service::{RenderService, StandardRenderService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cantor_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cantor Worker");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: store_url={}, performance_url={}",
        config.store_url, config.performance_url
    );

    if !config.process_budget_fits() {
        warn!(
            "Renderer and transcoder limits ({:?} + {:?}) exceed the render budget of {:?}; \
             the watchdog may fail renders that would otherwise finish",
            config.render.renderer_timeout,
            config.render.transcoder_timeout,
            config.max_render_time
        );
    }

    // Initialize clients
    let store_client = StoreClient::new(config.store_url.clone());
    let performance_client = PerformanceClient::new(config.performance_url.clone());

    // The store may still be starting (common in container environments)
    info!("Waiting for job store at {}", store_client.base_url());
    wait_for_store(&store_client).await?;
    info!("Job store reachable");

    // Initialize repositories and services
    let store: Arc<dyn JobStore> = Arc::new(HttpJobStore::new(store_client));
    let notifier: Arc<dyn PerformanceNotifier> =
        Arc::new(HttpPerformanceNotifier::new(performance_client));
    let renderer: Arc<dyn RenderService> =
        Arc::new(StandardRenderService::new(config.render.clone()));

    info!(
        "Renderer: {} (limit {:?}), transcoder: {} (limit {:?})",
        config.render.renderer.program,
        config.render.renderer_timeout,
        config.render.transcoder.program,
        config.render.transcoder_timeout
    );

    let scheduler = RenderScheduler::new(&config, store, notifier, renderer);

    info!("Worker initialized successfully");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = scheduler.run(shutdown).await {
        error!("Scheduler error: {}", e);
        return Err(e);
    }

    info!("Worker stopped");
    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(e) => {
            info!("Failed to load config from environment ({}), using defaults", e);
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Waits for the job store with exponential backoff
async fn wait_for_store(client: &StoreClient) -> Result<()> {
    const MAX_RETRIES: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 30_000;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match client.health().await {
            Ok(()) => {
                if attempt > 1 {
                    info!("Reached job store after {} attempt(s)", attempt);
                }
                return Ok(());
            }
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    error!("Job store unreachable after {} attempts", MAX_RETRIES);
                    return Err(anyhow::anyhow!("Job store unreachable: {}", e));
                }

                warn!(
                    "Job store not ready (attempt {}/{}): {}",
                    attempt, MAX_RETRIES, e
                );
                warn!("Retrying in {} ms...", delay_ms);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}
