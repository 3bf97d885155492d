//! Job command handlers
//!
//! Handles job-related CLI commands: listing, viewing details and peeking
//! at the job the worker would pick next.

use anyhow::Result;
use cantor_client::StoreClient;
use cantor_core::domain::job::{Job, JobStatus};
use clap::Subcommand;
use colored::*;

use crate::config::Config;
use crate::id_resolver::resolve_job_id;
use crate::types::IdOrPrefix;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List all jobs
    List,
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Show the job the worker would pick next
    Next,
}

/// Handle job commands
///
/// Routes job subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The job command to execute
/// * `config` - The CLI configuration
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = StoreClient::new(config.store_url.clone());

    match command {
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Next => next_job(&client).await,
    }
}

/// List all jobs
async fn list_jobs(client: &StoreClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Get and display a single job along with its render task
async fn get_job(client: &StoreClient, id: &str) -> Result<()> {
    let id_or_prefix = IdOrPrefix::parse(id);
    let uuid = resolve_job_id(client, &id_or_prefix).await?;

    let job = client.get_job(uuid).await?;
    print_job_details(&job);

    match client.find_task_by_job_id(uuid).await? {
        Some(task) => {
            println!("\n{}", "Render Task:".bold());
            println!("  ID:          {}", task.id.to_string().dimmed());
            println!("  Name:        {}", task.name.cyan());
            println!("  Performance: {}", task.performance_id.to_string().dimmed());
        }
        None => println!("\n{}", "No render task attached.".yellow()),
    }

    Ok(())
}

/// Display the next pending job
async fn next_job(client: &StoreClient) -> Result<()> {
    match client.find_next_pending().await? {
        Some(job) => {
            println!("{}", "Next pending job:".bold());
            println!();
            print_job_summary(&job);
        }
        None => println!("{}", "No pending jobs.".yellow()),
    }

    Ok(())
}

/// Print a job summary
fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    println!("    Status:   {}", colorize_status(job.status));
    println!("    Input:    {}", job.input_file.dimmed());
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  Status:      {}", colorize_status(job.status));
    println!("  Input:       {}", job.input_file);
    println!("  Output:      {}", job.out_file);
    println!("  Created:     {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated:     {}", job.updated_at.format("%Y-%m-%d %H:%M:%S"));

    if job.status.is_terminal() {
        let duration = job.updated_at.signed_duration_since(job.created_at);
        println!("  Duration:    {}s", duration.num_seconds());
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> colored::ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Started => status_str.cyan(),
        JobStatus::Satisfied => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}
