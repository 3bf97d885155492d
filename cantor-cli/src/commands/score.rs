//! Score command handlers
//!
//! Checks a score document locally, with the same rules the pipeline
//! applies before a job is created.

use anyhow::{Context, Result, bail};
use cantor_core::score::{Score, ScoreError};
use clap::Subcommand;
use colored::*;

/// Score subcommands
#[derive(Subcommand)]
pub enum ScoreCommands {
    /// Validate a score file
    Validate {
        /// Path to the score JSON document
        file: String,
    },
}

/// Handle score commands
pub fn handle_score_command(command: ScoreCommands) -> Result<()> {
    match command {
        ScoreCommands::Validate { file } => validate_score(&file),
    }
}

/// Validate a score file and print every problem found
fn validate_score(path: &str) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read score file: {}", path))?;

    match Score::from_json(&source) {
        Ok(score) => {
            println!("{}", "✓ Score is valid".green().bold());
            print_score_summary(&score);
            Ok(())
        }
        Err(ScoreError::Malformed(e)) => {
            println!("{}", "✗ Score could not be parsed".red().bold());
            println!("  {}", e.to_string().red());
            bail!("malformed score: {}", path)
        }
        Err(ScoreError::Invalid(violations)) => {
            println!(
                "{}",
                format!("✗ Score has {} violation(s):", violations.len())
                    .red()
                    .bold()
            );
            for violation in &violations {
                println!("  {} {}", violation.path.cyan(), violation.message);
            }
            bail!("invalid score: {}", path)
        }
    }
}

fn print_score_summary(score: &Score) {
    println!(
        "  Config: cps={} root={}",
        score.config.cps.to_string().cyan(),
        score.config.root.to_string().cyan()
    );
    println!("  Parts:  {}", score.parts.len());
    for (index, part) in score.parts.iter().enumerate() {
        let events: usize = part.events.iter().map(Vec::len).sum();
        println!(
            "    - [{}] {} {}",
            index,
            part.sound.timbre.to_string().cyan(),
            format!("({} events)", events).dimmed()
        );
    }
    println!("  Events: {}", score.event_count());
}
