//! Categories command for listing and editing categories.

use std::io::Write;

use anyhow::Result;

use wt_core::settings::BUILTIN_CATEGORIES;
use wt_core::{SnapshotStore, Tracker};

pub fn list<W: Write, S: SnapshotStore>(writer: &mut W, tracker: &Tracker<S>) -> Result<()> {
    for category in tracker.categories()? {
        if BUILTIN_CATEGORIES.contains(&category.as_str()) {
            writeln!(writer, "- {category}")?;
        } else {
            writeln!(writer, "- {category} (custom)")?;
        }
    }
    Ok(())
}

pub fn add<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    name: &str,
) -> Result<()> {
    let category = tracker.add_category(name)?;
    writeln!(writer, "Added category {category}")?;
    Ok(())
}

pub fn remove<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    name: &str,
) -> Result<()> {
    tracker.remove_category(name)?;
    writeln!(writer, "Removed category {name}")?;
    Ok(())
}
