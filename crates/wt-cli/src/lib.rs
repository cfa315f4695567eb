//! Web time tracker CLI library.
//!
//! This crate provides the CLI interface for the web time tracker.

mod cli;
pub mod commands;
mod config;

use anyhow::{Context, Result};

use wt_core::{CategoryRuleSet, Tracker};
use wt_db::Database;

pub use cli::{CategoriesAction, Cli, Commands, OverrideAction, PatternAction};
pub use config::Config;

/// Loads the rule set: the configured rule document, or the built-in rules.
pub fn load_rules(config: &Config) -> Result<CategoryRuleSet> {
    match &config.rules_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read rules from {}", path.display()))?;
            CategoryRuleSet::from_json(&json)
                .with_context(|| format!("invalid rules in {}", path.display()))
        }
        None => CategoryRuleSet::builtin().context("built-in rules failed to load"),
    }
}

/// Opens the database, creating its directory, and builds a tracker on it.
pub fn open_tracker(config: &Config) -> Result<Tracker<Database>> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let rules = load_rules(config)?;
    Tracker::open(rules, db).context("failed to load saved patterns")
}
