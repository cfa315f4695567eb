//! Record command for adding a single finished visit.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Args;

use wt_core::{
    ActivityRecord, Domain, RecordOutcome, SnapshotStore, TabId, TabInfo, Tracker, Visit,
};

use super::util::{format_duration, parse_datetime};

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// URL that was visited.
    pub url: String,

    /// How long the visit lasted, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub duration: u64,

    /// When the visit started (default: `duration` before now).
    #[arg(long)]
    pub start: Option<String>,

    /// Page title.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Browser tab id.
    #[arg(long, default_value_t = 0)]
    pub tab_id: u32,
}

pub fn run<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    args: RecordArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let start_time = match &args.start {
        Some(start) => parse_datetime(start, now)?,
        None => {
            let elapsed = i64::try_from(args.duration)
                .ok()
                .and_then(Duration::try_seconds)
                .context("duration out of range")?;
            now - elapsed
        }
    };
    let visit = Visit {
        tab: TabInfo {
            tab_id: TabId::from(args.tab_id),
            url: args.url,
            title: args.title,
        },
        start_time,
        duration_ms: args.duration.saturating_mul(1000),
    };
    let url = visit.tab.url.clone();

    match tracker.record_visit_at(visit, now)? {
        RecordOutcome::Stored(record) => {
            writeln!(
                writer,
                "Recorded {} on {} as {}",
                format_duration(record.duration_ms),
                site(&record),
                record.category
            )?;
        }
        RecordOutcome::Expired(record) => {
            writeln!(
                writer,
                "Discarded {} on {}: {} is outside the retention window",
                format_duration(record.duration_ms),
                site(&record),
                record.date()
            )?;
        }
        RecordOutcome::Untrackable => writeln!(writer, "Skipped {url}: not a trackable page")?,
    }
    Ok(())
}

fn site(record: &ActivityRecord) -> String {
    Domain::from_url(&record.url).map_or_else(|| record.url.clone(), |domain| domain.to_string())
}
