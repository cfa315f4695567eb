//! The persisted state and the contract for storing it.
//!
//! Everything the tracker keeps lives in one [`Snapshot`]. Writers follow a
//! read-modify-write cycle; [`SnapshotStore::update`] runs that cycle as one
//! unit so that a failed write never leaves a half-applied mutation behind.

use std::convert::Infallible;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityRecord, ActivityStore};
use crate::retention::{self, PruneStats};
use crate::settings::Settings;
use crate::stats::{DailyBucket, DailyStats};

/// Full persisted state: activities, daily stats and settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub activities: ActivityStore,
    pub daily_stats: DailyStats,
    pub settings: Settings,
}

/// What a single append did to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was stored and aggregated.
    Recorded(PruneStats),
    /// The record fell outside the retention window and was pruned in the
    /// same write.
    Expired(PruneStats),
    /// The record was not trackable and nothing changed.
    Dropped,
}

impl AppendOutcome {
    pub const fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

impl Snapshot {
    /// Appends, aggregates and prunes in one step.
    ///
    /// Non-trackable records leave the snapshot untouched, pruning included.
    pub fn append_activity(&mut self, record: ActivityRecord, now: DateTime<Utc>) -> AppendOutcome {
        if !record.is_trackable() {
            tracing::debug!(url = %record.url, "ignoring non-trackable visit");
            return AppendOutcome::Dropped;
        }
        let date = record.date();
        self.daily_stats.record(&record);
        self.activities.append(record);
        let pruned = self.prune(now);
        if pruned.cutoff.is_some_and(|cutoff| date < cutoff) {
            tracing::debug!(%date, "visit is older than the retention window");
            return AppendOutcome::Expired(pruned);
        }
        AppendOutcome::Recorded(pruned)
    }

    /// Applies the retention window from the settings.
    pub fn prune(&mut self, now: DateTime<Utc>) -> PruneStats {
        retention::prune(
            &mut self.activities,
            &mut self.daily_stats,
            self.settings.retention_days,
            now,
        )
    }

    pub fn daily_bucket(&self, date: NaiveDate) -> Option<&DailyBucket> {
        self.daily_stats.get(date)
    }
}

/// Persistence boundary for the tracker.
///
/// Implementations must make [`SnapshotStore::update`] atomic with respect
/// to other writers: no other write may land between its read and its
/// write, otherwise updates are lost.
pub trait SnapshotStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the current snapshot, or the initial snapshot if nothing was stored yet.
    fn read(&self) -> Result<Snapshot, Self::Error>;

    /// Replaces the stored snapshot.
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), Self::Error>;

    /// Reads, mutates and writes back as one unit.
    ///
    /// A mutation that leaves the snapshot unchanged is not written. The
    /// default implementation is only atomic for stores with a single
    /// writer; shared stores override it.
    fn update<T, F>(&mut self, mutate: F) -> Result<T, Self::Error>
    where
        F: FnOnce(&mut Snapshot) -> T,
    {
        let original = self.read()?;
        let mut snapshot = original.clone();
        let output = mutate(&mut snapshot);
        if snapshot != original {
            self.write(&snapshot)?;
        }
        Ok(output)
    }
}

/// In-process snapshot store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Snapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl SnapshotStore for MemoryStore {
    type Error = Infallible;

    fn read(&self) -> Result<Snapshot, Self::Error> {
        Ok(self.snapshot.clone())
    }

    fn write(&mut self, snapshot: &Snapshot) -> Result<(), Self::Error> {
        self.snapshot = snapshot.clone();
        Ok(())
    }
}
