//! Core domain logic for the web time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: mapping visited URLs to categories through user
//!   overrides, a bounded TTL cache and ordered regex rules
//! - Aggregation: rolling visits into per-day, per-category totals
//! - Retention: pruning history outside the configured window
//! - Tab sessions: turning browser tab signals into finished visits

pub mod activity;
pub mod cache;
pub mod classifier;
pub mod domain;
pub mod retention;
pub mod rules;
pub mod settings;
pub mod snapshot;
pub mod stats;
pub mod tab;
mod tracker;
pub mod types;

pub use activity::{ActivityRecord, ActivityStore, is_trackable};
pub use cache::ClassificationCache;
pub use classifier::{Classification, ClassificationSource, Classifier, Overrides};
pub use domain::Domain;
pub use rules::{CategoryRuleSet, RuleError};
pub use settings::Settings;
pub use snapshot::{MemoryStore, Snapshot, SnapshotStore};
pub use stats::{CategoryTotals, DailyBucket, DailyStats};
pub use tab::{TabInfo, TabSession, Visit};
pub use tracker::{RecordOutcome, TrackError, Tracker};
pub use types::{Category, DEFAULT_CATEGORY, TabId, ValidationError};
