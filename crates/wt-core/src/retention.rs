//! Retention window enforcement.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::activity::ActivityStore;
use crate::stats::DailyStats;

/// Default number of days of history kept.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Outcome of a prune pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub cutoff: Option<NaiveDate>,
    pub activities_removed: usize,
    pub buckets_removed: usize,
}

/// Earliest date that survives pruning: `today - retention_days`.
///
/// Returns `None` if the subtraction underflows the calendar, in which case
/// nothing is old enough to prune.
pub fn cutoff_date(now: DateTime<Utc>, retention_days: u32) -> Option<NaiveDate> {
    now.date_naive()
        .checked_sub_days(Days::new(u64::from(retention_days)))
}

/// Removes activities and buckets dated strictly before the cutoff.
pub fn prune(
    activities: &mut ActivityStore,
    stats: &mut DailyStats,
    retention_days: u32,
    now: DateTime<Utc>,
) -> PruneStats {
    let Some(cutoff) = cutoff_date(now, retention_days) else {
        return PruneStats::default();
    };
    let result = PruneStats {
        cutoff: Some(cutoff),
        activities_removed: activities.remove_before(cutoff),
        buckets_removed: stats.remove_before(cutoff),
    };
    if result.activities_removed > 0 || result.buckets_removed > 0 {
        tracing::info!(
            %cutoff,
            activities = result.activities_removed,
            buckets = result.buckets_removed,
            "pruned history outside retention window"
        );
    }
    result
}
