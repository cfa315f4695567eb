//! Ingest command for replaying browser tab events.
//!
//! Reads one JSON object per line, for example:
//!
//! ```json
//! {"type":"activated","tabId":3,"url":"https://github.com","title":"GitHub","timestamp":"2026-03-10T09:00:00Z"}
//! {"type":"tick","timestamp":"2026-03-10T09:01:00Z"}
//! {"type":"defocused","timestamp":"2026-03-10T09:01:30Z"}
//! ```
//!
//! Event types are `activated`, `navigated`, `defocused` and `tick`. Every
//! event closes the visit in progress, which is then classified and stored.
//! Event timestamps only place and time the visits; the retention window is
//! measured from the wall clock passed to [`run`]. A visit still open at end
//! of input is not recorded.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use wt_core::{RecordOutcome, SnapshotStore, TabId, TabInfo, TabSession, Tracker};

use super::util::plural;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TabEventKind {
    Activated,
    Navigated,
    Defocused,
    Tick,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTabId {
    Number(u32),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabEvent {
    #[serde(rename = "type")]
    kind: TabEventKind,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    tab_id: Option<RawTabId>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: String,
}

impl TabEvent {
    fn tab(self) -> Result<TabInfo> {
        let tab_id = match self.tab_id.context("missing tabId")? {
            RawTabId::Number(id) => TabId::from(id),
            RawTabId::Text(id) => TabId::new(id)?,
        };
        let url = self.url.context("missing url")?;
        Ok(TabInfo {
            tab_id,
            url,
            title: self.title,
        })
    }
}

/// Counts reported after an ingest run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub events: usize,
    pub recorded: usize,
    /// Finished visits dated before the retention cutoff.
    pub expired: usize,
    pub malformed: usize,
    pub open_visit: bool,
}

pub fn run<R: BufRead, W: Write, S: SnapshotStore>(
    reader: R,
    writer: &mut W,
    tracker: &mut Tracker<S>,
    now: DateTime<Utc>,
) -> Result<IngestSummary> {
    let mut session = TabSession::new();
    let mut summary = IngestSummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: TabEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(line = idx + 1, error = %err, "skipping malformed event");
                summary.malformed += 1;
                continue;
            }
        };
        let timestamp = event.timestamp;
        let finished = match event.kind {
            TabEventKind::Defocused => session.defocus(timestamp),
            TabEventKind::Tick => session.tick(timestamp),
            kind @ (TabEventKind::Activated | TabEventKind::Navigated) => {
                let tab = match event.tab() {
                    Ok(tab) => tab,
                    Err(err) => {
                        tracing::warn!(line = idx + 1, error = %err, "skipping malformed event");
                        summary.malformed += 1;
                        continue;
                    }
                };
                if matches!(kind, TabEventKind::Activated) {
                    session.activate(tab, timestamp)
                } else {
                    session.navigate(tab, timestamp)
                }
            }
        };
        summary.events += 1;

        if let Some(visit) = finished {
            match tracker.record_visit_at(visit, now)? {
                RecordOutcome::Stored(_) => summary.recorded += 1,
                RecordOutcome::Expired(_) => summary.expired += 1,
                RecordOutcome::Untrackable => {}
            }
        }
    }

    if let Some(tab) = session.active_tab() {
        tracing::debug!(url = %tab.url, "visit still open at end of input");
        summary.open_visit = true;
    }

    write!(
        writer,
        "Ingested {}: {} recorded",
        plural(summary.events as u64, "event"),
        plural(summary.recorded as u64, "visit")
    )?;
    if summary.expired > 0 {
        write!(writer, ", {} outside the retention window", summary.expired)?;
    }
    if summary.malformed > 0 {
        write!(writer, ", {} malformed", summary.malformed)?;
    }
    if summary.open_visit {
        write!(writer, " (1 visit still open)")?;
    }
    writeln!(writer)?;

    Ok(summary)
}
