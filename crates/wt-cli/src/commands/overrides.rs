//! Override command for pinning domains to categories.

use std::io::Write;

use anyhow::Result;

use wt_core::{SnapshotStore, Tracker};

pub fn set<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    domain: &str,
    category: &str,
) -> Result<()> {
    let domain = tracker.set_override(domain, category)?;
    writeln!(writer, "{domain} -> {category}")?;
    Ok(())
}

pub fn remove<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    domain: &str,
) -> Result<()> {
    if tracker.remove_override(domain)? {
        writeln!(writer, "Removed override for {}", domain.trim().to_ascii_lowercase())?;
    } else {
        writeln!(writer, "No override for {domain}")?;
    }
    Ok(())
}

pub fn list<W: Write, S: SnapshotStore>(writer: &mut W, tracker: &Tracker<S>) -> Result<()> {
    let settings = tracker.settings()?;
    if settings.overrides.is_empty() {
        writeln!(writer, "No overrides.")?;
        return Ok(());
    }
    for (domain, category) in &settings.overrides {
        writeln!(writer, "{domain} -> {category}")?;
    }
    Ok(())
}
