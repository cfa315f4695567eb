//! The tracker: classification wired to a snapshot store.
//!
//! [`Tracker`] is the composition root. It owns one [`Classifier`] and one
//! [`SnapshotStore`]; consumers get a reference to it instead of reaching for
//! global state.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::activity::{ActivityRecord, is_trackable};
use crate::classifier::{Classification, Classifier};
use crate::rules::{self, CategoryRuleSet, RuleError};
use crate::settings::{CustomPattern, Settings};
use crate::snapshot::{AppendOutcome, Snapshot, SnapshotStore};
use crate::stats::DailyBucket;
use crate::tab::Visit;
use crate::types::{Category, ValidationError};

/// Errors surfaced by tracker operations.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The snapshot could not be read or written. Nothing was applied.
    #[error("persistence unavailable")]
    PersistenceUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A rule pattern failed to compile.
    #[error(transparent)]
    InvalidPattern(#[from] RuleError),
    /// A settings change was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl TrackError {
    fn persistence<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        tracing::warn!(error = %err, "snapshot store failed");
        Self::PersistenceUnavailable(Box::new(err))
    }
}

/// What became of a visit handed to [`Tracker::record_visit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored and aggregated.
    Stored(ActivityRecord),
    /// Dated before the retention cutoff, so the write pruned it again.
    Expired(ActivityRecord),
    /// Internal or blank page. The store was not touched.
    Untrackable,
}

impl RecordOutcome {
    /// The record, if it is still in the store.
    pub const fn stored(&self) -> Option<&ActivityRecord> {
        match self {
            Self::Stored(record) => Some(record),
            _ => None,
        }
    }

    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

/// Classifies visits and records them into the store.
#[derive(Debug)]
pub struct Tracker<S> {
    classifier: Classifier,
    store: S,
}

impl<S: SnapshotStore> Tracker<S> {
    /// Creates a tracker without consulting the store.
    pub fn new(classifier: Classifier, store: S) -> Self {
        Self { classifier, store }
    }

    /// Creates a tracker and re-applies the user's saved custom patterns.
    pub fn open(rules: CategoryRuleSet, store: S) -> Result<Self, TrackError> {
        let settings = store.read().map_err(TrackError::persistence)?.settings;
        let classifier = Classifier::new(rules);
        for custom in &settings.custom_patterns {
            classifier.add_pattern(custom.category.as_str(), &custom.pattern)?;
        }
        Ok(Self::new(classifier, store))
    }

    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> Result<Snapshot, TrackError> {
        self.store.read().map_err(TrackError::persistence)
    }

    pub fn settings(&self) -> Result<Settings, TrackError> {
        Ok(self.snapshot()?.settings)
    }

    /// Classifies a URL against the stored overrides.
    pub fn classify(&self, url: &str) -> Result<Classification, TrackError> {
        let settings = self.settings()?;
        Ok(self.classifier.classify(url, &settings.overrides))
    }

    /// Classifies and stores a finished visit.
    pub fn record_visit(&mut self, visit: Visit) -> Result<RecordOutcome, TrackError> {
        self.record_visit_at(visit, Utc::now())
    }

    /// Like [`Tracker::record_visit`], with `now` as the wall clock that
    /// places the retention cutoff.
    pub fn record_visit_at(
        &mut self,
        visit: Visit,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, TrackError> {
        if !is_trackable(&visit.tab.url) {
            tracing::debug!(url = %visit.tab.url, "skipping non-trackable visit");
            return Ok(RecordOutcome::Untrackable);
        }
        let classifier = &self.classifier;
        self.store
            .update(|snapshot| {
                let category = classifier
                    .classify_at(&visit.tab.url, &snapshot.settings.overrides, now)
                    .category;
                let record = ActivityRecord {
                    tab_id: visit.tab.tab_id,
                    url: visit.tab.url,
                    title: visit.tab.title,
                    category,
                    start_time: visit.start_time,
                    duration_ms: visit.duration_ms,
                };
                match snapshot.append_activity(record.clone(), now) {
                    AppendOutcome::Recorded(_) => RecordOutcome::Stored(record),
                    AppendOutcome::Expired(_) => RecordOutcome::Expired(record),
                    AppendOutcome::Dropped => RecordOutcome::Untrackable,
                }
            })
            .map_err(TrackError::persistence)
    }

    /// Stats for one UTC date, if anything was recorded that day.
    pub fn daily_bucket(&self, date: NaiveDate) -> Result<Option<DailyBucket>, TrackError> {
        Ok(self.snapshot()?.daily_bucket(date).cloned())
    }

    /// Configured category names in display order.
    pub fn categories(&self) -> Result<Vec<Category>, TrackError> {
        Ok(self.settings()?.categories)
    }

    /// Drops cached classifications. Call after editing overrides elsewhere.
    pub fn invalidate_cache(&self) {
        self.classifier.clear_cache();
    }

    pub fn add_category(&mut self, name: &str) -> Result<Category, TrackError> {
        self.update_settings(|settings| settings.add_category(name))
    }

    pub fn remove_category(&mut self, name: &str) -> Result<(), TrackError> {
        self.update_settings(|settings| settings.remove_category(name))
    }

    /// Sets a domain override and invalidates the classification cache.
    pub fn set_override(&mut self, domain: &str, category: &str) -> Result<String, TrackError> {
        let domain = self.update_settings(|settings| settings.set_override(domain, category))?;
        self.classifier.clear_cache();
        Ok(domain)
    }

    /// Removes a domain override and invalidates the classification cache.
    pub fn remove_override(&mut self, domain: &str) -> Result<bool, TrackError> {
        let removed = self.update_settings(|settings| Ok(settings.remove_override(domain)))?;
        if removed {
            self.classifier.clear_cache();
        }
        Ok(removed)
    }

    /// Changes the retention window and prunes with the new window.
    pub fn set_retention_days(&mut self, days: u32) -> Result<(), TrackError> {
        self.set_retention_days_at(days, Utc::now())
    }

    pub fn set_retention_days_at(&mut self, days: u32, now: DateTime<Utc>) -> Result<(), TrackError> {
        let result = self
            .store
            .update(|snapshot| {
                snapshot.settings.set_retention_days(days)?;
                snapshot.prune(now);
                Ok::<_, ValidationError>(())
            })
            .map_err(TrackError::persistence)?;
        Ok(result?)
    }

    /// Validates, persists and activates a custom rule pattern.
    ///
    /// A pattern that fails to compile changes neither the rules nor the store.
    pub fn add_pattern(&mut self, category: &str, pattern: &str) -> Result<(), TrackError> {
        let category = Category::new(category)?;
        rules::compile(&category, pattern)?;
        let custom = CustomPattern {
            category: category.clone(),
            pattern: pattern.to_string(),
        };
        self.store
            .update(|snapshot| snapshot.settings.custom_patterns.push(custom))
            .map_err(TrackError::persistence)?;
        self.classifier.add_pattern(category.as_str(), pattern)?;
        // new rules must not be shadowed by stale "Other" entries
        self.classifier.clear_cache();
        Ok(())
    }

    fn update_settings<T, F>(&mut self, change: F) -> Result<T, TrackError>
    where
        F: FnOnce(&mut Settings) -> Result<T, ValidationError>,
    {
        let result = self
            .store
            .update(|snapshot| change(&mut snapshot.settings))
            .map_err(TrackError::persistence)?;
        Ok(result?)
    }
}
