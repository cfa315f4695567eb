//! Pattern command for adding hostname rules.

use std::io::Write;

use anyhow::Result;

use wt_core::{SnapshotStore, Tracker};

pub fn add<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    category: &str,
    pattern: &str,
) -> Result<()> {
    tracker.add_pattern(category, pattern)?;
    writeln!(writer, "Added pattern {pattern} to {category}")?;
    Ok(())
}

pub fn list<W: Write, S: SnapshotStore>(writer: &mut W, tracker: &Tracker<S>) -> Result<()> {
    let settings = tracker.settings()?;
    if settings.custom_patterns.is_empty() {
        writeln!(writer, "No custom patterns.")?;
        return Ok(());
    }
    for custom in &settings.custom_patterns {
        writeln!(writer, "{}: {}", custom.category, custom.pattern)?;
    }
    Ok(())
}
