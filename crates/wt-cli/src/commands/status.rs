//! Status command for showing what is stored and how it is configured.

use std::io::Write;

use anyhow::Result;

use wt_core::Tracker;
use wt_db::Database;

use crate::Config;

use super::util::plural;

pub fn run<W: Write>(writer: &mut W, tracker: &Tracker<Database>, config: &Config) -> Result<()> {
    let info = tracker.store().info()?;
    let settings = tracker.settings()?;

    writeln!(writer, "Web time tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    match &config.rules_path {
        Some(path) => writeln!(writer, "Rules: {}", path.display())?,
        None => writeln!(writer, "Rules: built-in")?,
    }

    match &info.updated_at {
        Some(updated_at) => writeln!(writer, "Last write: {updated_at} (version {})", info.version)?,
        None => {
            writeln!(writer, "Nothing recorded yet.")?;
            return Ok(());
        }
    }
    writeln!(
        writer,
        "Activities: {} over {}",
        info.activity_count,
        plural(u64::try_from(info.day_count).unwrap_or(0), "day")
    )?;
    writeln!(writer, "Retention: {} days", settings.retention_days)?;
    writeln!(writer, "Categories: {}", settings.categories.len())?;
    writeln!(writer, "Overrides: {}", settings.overrides.len())?;
    writeln!(writer, "Custom patterns: {}", settings.custom_patterns.len())?;

    Ok(())
}
