//! ID resolver module
//!
//! Handles resolution of UUID prefixes to full UUIDs by querying the job store.
//! This allows users to specify short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use cantor_client::StoreClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a job ID or prefix to a full UUID
///
/// If the input is already a full UUID, returns it immediately.
/// Otherwise, fetches all jobs and finds the one matching the prefix.
///
/// # Errors
/// Returns an error if:
/// - No job matches the prefix
/// - Multiple jobs match the prefix (ambiguous)
/// - The store call fails
pub async fn resolve_job_id(client: &StoreClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    // If it's already a full UUID, return it
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    select_unique(jobs.iter().map(|job| job.id), id_or_prefix)
}

/// Picks the single ID matching `id_or_prefix`
fn select_unique(ids: impl Iterator<Item = Uuid>, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    let matches: Vec<Uuid> = ids.filter(|id| id_or_prefix.matches(*id)).collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No job found with ID starting with '{}'",
            id_or_prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}
