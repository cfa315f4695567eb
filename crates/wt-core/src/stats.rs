//! Per-day, per-category time totals.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::ActivityRecord;
use crate::types::Category;

/// Time and visit totals for one category on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    /// Summed visit durations in milliseconds.
    #[serde(rename = "totalTime")]
    pub total_ms: u64,
    pub visit_count: u64,
}

/// Aggregated totals for one UTC calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub categories: BTreeMap<Category, CategoryTotals>,
}

impl DailyBucket {
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            categories: BTreeMap::new(),
        }
    }

    pub fn totals(&self, category: &Category) -> Option<CategoryTotals> {
        self.categories.get(category).copied()
    }

    /// Total tracked time across all categories.
    pub fn total_ms(&self) -> u64 {
        self.categories.values().map(|totals| totals.total_ms).sum()
    }

    pub fn visit_count(&self) -> u64 {
        self.categories.values().map(|totals| totals.visit_count).sum()
    }

    /// Categories ordered by time spent, most first; ties by name.
    pub fn breakdown(&self) -> Vec<(&Category, CategoryTotals)> {
        let mut rows: Vec<(&Category, CategoryTotals)> = self
            .categories
            .iter()
            .map(|(category, totals)| (category, *totals))
            .collect();
        rows.sort_by(|a, b| b.1.total_ms.cmp(&a.1.total_ms).then_with(|| a.0.cmp(b.0)));
        rows
    }

    fn add(&mut self, category: &Category, duration_ms: u64) {
        let totals = self.categories.entry(category.clone()).or_default();
        totals.total_ms = totals.total_ms.saturating_add(duration_ms);
        totals.visit_count += 1;
    }
}

/// All daily buckets keyed by date.
///
/// Collecting from buckets is meant for loading persisted state; new data
/// goes through [`DailyStats::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyStats {
    buckets: BTreeMap<NaiveDate, DailyBucket>,
}

impl DailyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one accepted activity into its day bucket.
    pub fn record(&mut self, activity: &ActivityRecord) {
        let date = activity.date();
        self.buckets
            .entry(date)
            .or_insert_with(|| DailyBucket::new(date))
            .add(&activity.category, activity.duration_ms);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyBucket> {
        self.buckets.get(&date)
    }

    /// Buckets in ascending date order.
    pub fn buckets(&self) -> impl Iterator<Item = &DailyBucket> {
        self.buckets.values()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Removes whole buckets dated before `cutoff`, returning how many went.
    pub(crate) fn remove_before(&mut self, cutoff: NaiveDate) -> usize {
        let kept = self.buckets.split_off(&cutoff);
        let removed = self.buckets.len();
        self.buckets = kept;
        removed
    }
}

impl FromIterator<DailyBucket> for DailyStats {
    fn from_iter<I: IntoIterator<Item = DailyBucket>>(iter: I) -> Self {
        Self {
            buckets: iter.into_iter().map(|bucket| (bucket.date, bucket)).collect(),
        }
    }
}
