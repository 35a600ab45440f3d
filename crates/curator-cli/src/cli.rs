//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Curator: controlled-vocabulary correction for tabular metadata
#[derive(Parser)]
#[command(name = "curator")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a table against a data model and list discrepancies
    Check {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Data model path or http(s) URL (JSON-LD)
        #[arg(short, long)]
        schema: String,

        /// Only check these columns (repeatable)
        #[arg(short, long)]
        column: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Review discrepancies interactively in the console
    Review {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Data model path or http(s) URL (JSON-LD)
        #[arg(short, long)]
        schema: String,

        /// Session file (default: <file>.session.json); resumed if it exists
        #[arg(long)]
        session: Option<PathBuf>,

        /// Plan file written on approval (default: <file>.plan.json)
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Accept confident suggestions in bulk
    Batch {
        /// Path to session file
        #[arg(value_name = "SESSION_FILE")]
        file: PathBuf,

        /// Accept top suggestions at or above this confidence
        #[arg(long, default_value = "0.9")]
        min_confidence: f64,

        /// Filter by column name
        #[arg(long, short = 'c')]
        column: Option<String>,

        /// Reject whatever is still pending afterwards
        #[arg(long)]
        reject_rest: bool,
    },

    /// Show review progress and summary
    Status {
        /// Path to session file
        #[arg(value_name = "SESSION_FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Freeze a completed review into a correction plan
    Approve {
        /// Path to session file
        #[arg(value_name = "SESSION_FILE")]
        file: PathBuf,

        /// Output path for the plan (default: next to the session)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply an approved plan and write the corrected table
    Apply {
        /// Path to plan file
        #[arg(value_name = "PLAN_FILE")]
        file: PathBuf,

        /// Table to apply the plan to
        #[arg(short, long)]
        table: PathBuf,

        /// Output path for the corrected table (default: <table>_curated.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of entity updates in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the apply report as JSON
        #[arg(long)]
        json: bool,
    },
}
