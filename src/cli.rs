//! Command-line interface for landtrack

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "landtrack")]
#[command(about = "Tracks a published land-sales register and reports newly appended sites")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize landtrack workspace
    Init {
        /// Overwrite an existing configuration with defaults
        #[arg(long)]
        force: bool,
    },

    /// Download today's copy of the register
    Fetch {
        /// Source URL (defaults to the configured one)
        #[arg(long)]
        url: Option<String>,
    },

    /// List stored snapshots
    List {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show the key columns inferred for a snapshot
    Keys {
        /// Snapshot file name in the store, or a path
        snapshot: String,
    },

    /// Report rows added since the previous snapshot
    Compare {
        /// Newer snapshot (defaults to the latest stored one)
        newer: Option<String>,

        /// Older snapshot (defaults to the one preceding the newer)
        older: Option<String>,

        /// Report format: "json", "csv" (defaults to the configured one)
        #[arg(long)]
        format: Option<String>,

        /// Directory for the report (defaults to the workspace reports directory)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write a report even when nothing is new
        #[arg(long)]
        always_report: bool,

        /// Use these key columns instead of inferring them
        #[arg(long = "key")]
        keys: Vec<String>,

        #[command(flatten)]
        submission: SubmissionArgs,
    },

    /// Fetch today's register, then compare it with the previous snapshot
    Run {
        /// Report format: "json", "csv" (defaults to the configured one)
        #[arg(long)]
        format: Option<String>,

        /// Write a report even when nothing is new
        #[arg(long)]
        always_report: bool,

        #[command(flatten)]
        submission: SubmissionArgs,
    },

    /// Scrape the current listing page and save it as a dated snapshot
    Scrape {
        /// Listing page URL (defaults to the configured one)
        #[arg(long)]
        url: Option<String>,

        /// Visit the pages of awarded sites
        #[arg(long)]
        follow_awarded: bool,
    },
}

/// Downstream form submission flags
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SubmissionArgs {
    /// Offer new entries for form submission
    #[arg(long)]
    pub submit: bool,

    /// Submit every new entry without asking
    #[arg(long, requires = "submit", conflicts_with = "approve")]
    pub yes: bool,

    /// Submit only these entry numbers (1-based) without asking
    #[arg(long, requires = "submit", num_args = 1.., value_parser = validate_entry_number)]
    pub approve: Vec<usize>,
}

/// Parse output format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Entry numbers are 1-based
fn validate_entry_number(s: &str) -> Result<usize, String> {
    let number: usize = s
        .parse()
        .map_err(|_| format!("Invalid entry number: '{}'. Must be a positive integer.", s))?;

    if number == 0 {
        return Err("Entry numbers start at 1".to_string());
    }

    Ok(number)
}
