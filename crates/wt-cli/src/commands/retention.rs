//! Retention command for the history window.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};

use wt_core::{SnapshotStore, Tracker};

use super::util::plural;

/// Prints the retention window, or changes it and prunes right away.
pub fn run<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    days: Option<u32>,
    now: DateTime<Utc>,
) -> Result<()> {
    match days {
        None => {
            let days = tracker.settings()?.retention_days;
            writeln!(writer, "Keeping {} of history", plural(u64::from(days), "day"))?;
        }
        Some(days) => {
            let before = tracker.snapshot()?.activities.len();
            tracker.set_retention_days_at(days, now)?;
            let removed = before.saturating_sub(tracker.snapshot()?.activities.len());
            writeln!(
                writer,
                "Keeping {} of history ({} pruned)",
                plural(u64::from(days), "day"),
                plural(removed as u64, "record")
            )?;
        }
    }
    Ok(())
}
