//! Individual visit records and the append-only activity store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Category, TabId};

/// URL schemes that belong to the browser itself and are never tracked.
const INTERNAL_SCHEMES: &[&str] = &[
    "chrome:",
    "chrome-extension:",
    "chrome-search:",
    "chrome-untrusted:",
    "edge:",
    "about:",
    "moz-extension:",
    "brave:",
    "opera:",
    "vivaldi:",
    "devtools:",
    "view-source:",
];

/// Returns whether a visit to `url` should be recorded at all.
///
/// Empty URLs and browser-internal pages (settings, new tab, extensions)
/// are not trackable.
pub fn is_trackable(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    !INTERNAL_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// One finished visit to a page.
///
/// The category is assigned when the record is built and never recomputed,
/// even if rules or overrides change later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub tab_id: TabId,
    pub url: String,
    pub title: String,
    pub category: Category,
    /// When the visit started.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    /// Visit length in milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl ActivityRecord {
    /// The UTC calendar date the visit is counted under.
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    pub fn is_trackable(&self) -> bool {
        is_trackable(&self.url)
    }
}

/// Append-only list of visits in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityStore {
    records: Vec<ActivityRecord>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Non-trackable records are dropped and `false` is returned.
    pub fn append(&mut self, record: ActivityRecord) -> bool {
        if !record.is_trackable() {
            tracing::debug!(url = %record.url, "dropping non-trackable visit");
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records counted under `date`.
    pub fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter().filter(move |record| record.date() == date)
    }

    /// Removes every record dated before `cutoff`, returning how many went.
    pub(crate) fn remove_before(&mut self, cutoff: NaiveDate) -> usize {
        let before = self.records.len();
        self.records.retain(|record| record.date() >= cutoff);
        before - self.records.len()
    }
}

impl FromIterator<ActivityRecord> for ActivityStore {
    /// Rebuilds a store from persisted records, keeping their order.
    fn from_iter<I: IntoIterator<Item = ActivityRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
