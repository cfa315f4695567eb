//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::record::RecordArgs;

/// Web time tracker.
///
/// Classifies visited sites into categories and keeps per-day totals of
/// where browsing time goes.
#[derive(Debug, Parser)]
#[command(name = "wt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a single finished visit.
    Record(RecordArgs),

    /// Replay browser tab events (JSONL on stdin) and record the resulting visits.
    Ingest,

    /// Show which category a URL falls into.
    Classify {
        /// URL to classify.
        url: String,

        /// Show the normalized domain and which step decided.
        #[arg(long)]
        explain: bool,
    },

    /// Show time per category for one day.
    Stats {
        /// Day to show: YYYY-MM-DD, "today" or "yesterday" (default: today, UTC).
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage categories.
    #[command(subcommand)]
    Categories(CategoriesAction),

    /// Manage per-domain category overrides.
    #[command(subcommand)]
    Override(OverrideAction),

    /// Manage custom rule patterns.
    #[command(subcommand)]
    Pattern(PatternAction),

    /// Show or change how many days of history are kept.
    Retention {
        /// New retention window in days.
        days: Option<u32>,
    },

    /// Show storage and settings summary.
    Status,
}

#[derive(Debug, Subcommand)]
pub enum CategoriesAction {
    /// List configured categories.
    List,
    /// Add a category.
    Add { name: String },
    /// Remove a user-added category.
    Remove { name: String },
}

#[derive(Debug, Subcommand)]
pub enum OverrideAction {
    /// Always put a domain into a category.
    Set { domain: String, category: String },
    /// Remove a domain override.
    Remove { domain: String },
    /// List domain overrides.
    List,
}

#[derive(Debug, Subcommand)]
pub enum PatternAction {
    /// Add a regex matched against the hostname.
    Add { category: String, pattern: String },
    /// List user-added patterns.
    List,
}
