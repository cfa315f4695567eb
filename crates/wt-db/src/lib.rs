//! Storage layer for the web time tracker.
//!
//! Persists the tracker [`Snapshot`] using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! Separate processes may open the same file. Every logical write runs in an
//! `IMMEDIATE` transaction, which takes the database write lock before the
//! snapshot is read, so two writers can never interleave a read-modify-write
//! cycle and double count a visit.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format with millisecond precision
//! (e.g., `2024-01-15T10:30:00.000Z`). Lexicographic ordering matches
//! chronological ordering. Dates are stored as `YYYY-MM-DD`.
//!
//! ## Settings Storage
//!
//! Settings are plain key-value rows; the `value` column holds JSON. Keys use
//! the same names as the snapshot JSON (`categories`, `customCategories`,
//! `retentionDays`, `customPatterns`). Unknown keys are ignored and missing
//! keys fall back to defaults.
//!
//! ## Versioning
//!
//! `snapshot_meta.version` increases by one on every committed write. Callers
//! that read and write in separate steps can use
//! [`Database::write_if_version`] for an optimistic check.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::{Map, Value};
use thiserror::Error;

use wt_core::{
    ActivityRecord, ActivityStore, Category, CategoryTotals, DailyBucket, DailyStats, Settings,
    Snapshot, SnapshotStore, TabId,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Settings could not be encoded or decoded.
    #[error("invalid settings value for {key}")]
    Settings {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in {table}: {timestamp}")]
    TimestampParse {
        table: &'static str,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row violates a core invariant.
    #[error("invalid row in {table}: {message}")]
    InvalidRow { table: &'static str, message: String },
    /// Another writer committed since the snapshot was read.
    #[error("snapshot version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: i64, found: i64 },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Bookkeeping about the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub version: i64,
    pub updated_at: Option<String>,
    pub activity_count: i64,
    pub day_count: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(std::time::Duration::from_secs(5))?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshot_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL,
                updated_at TEXT
            );

            INSERT OR IGNORE INTO snapshot_meta (id, version, updated_at) VALUES (1, 0, NULL);

            -- Activities table: one row per finished visit, in arrival order
            -- start_time: ISO 8601 format (e.g., '2024-01-15T10:30:00.000Z')
            -- date: UTC calendar date of start_time
            CREATE TABLE IF NOT EXISTS activities (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                tab_id TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                start_time TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_activities_date ON activities(date);

            CREATE TABLE IF NOT EXISTS daily_stats (
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                total_ms INTEGER NOT NULL,
                visit_count INTEGER NOT NULL,
                PRIMARY KEY (date, category)
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Reads the snapshot together with its version.
    pub fn read_versioned(&self) -> Result<(i64, Snapshot), DbError> {
        load(&self.conn)
    }

    /// Current snapshot version.
    pub fn version(&self) -> Result<i64, DbError> {
        current_version(&self.conn)
    }

    /// Writes `snapshot` only if nobody else wrote since `expected` was read.
    ///
    /// Returns the new version.
    pub fn write_if_version(&mut self, snapshot: &Snapshot, expected: i64) -> Result<i64, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let found = current_version(&tx)?;
        if found != expected {
            return Err(DbError::VersionConflict { expected, found });
        }
        let version = store(&tx, snapshot, Utc::now())?;
        tx.commit()?;
        Ok(version)
    }

    /// Summary of what is stored, for status output.
    pub fn info(&self) -> Result<SnapshotInfo, DbError> {
        let (version, updated_at) = self.conn.query_row(
            "SELECT version, updated_at FROM snapshot_meta WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let activity_count = self
            .conn
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
        let day_count = self.conn.query_row(
            "SELECT COUNT(DISTINCT date) FROM daily_stats",
            [],
            |row| row.get(0),
        )?;
        Ok(SnapshotInfo {
            version,
            updated_at,
            activity_count,
            day_count,
        })
    }
}

impl SnapshotStore for Database {
    type Error = DbError;

    fn read(&self) -> Result<Snapshot, DbError> {
        Ok(load(&self.conn)?.1)
    }

    fn write(&mut self, snapshot: &Snapshot) -> Result<(), DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        store(&tx, snapshot, Utc::now())?;
        tx.commit()?;
        Ok(())
    }

    /// Runs the whole read-modify-write cycle under the database write lock.
    fn update<T, F>(&mut self, mutate: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Snapshot) -> T,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (_, original) = load(&tx)?;
        let mut snapshot = original.clone();
        let output = mutate(&mut snapshot);
        if snapshot != original {
            let version = store(&tx, &snapshot, Utc::now())?;
            tx.commit()?;
            tracing::debug!(version, "committed snapshot");
        }
        Ok(output)
    }
}

fn current_version(conn: &Connection) -> Result<i64, DbError> {
    let version = conn.query_row(
        "SELECT version FROM snapshot_meta WHERE id = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn load(conn: &Connection) -> Result<(i64, Snapshot), DbError> {
    let version = current_version(conn)?;
    let snapshot = Snapshot {
        activities: load_activities(conn)?,
        daily_stats: load_daily_stats(conn)?,
        settings: load_settings(conn)?,
    };
    Ok((version, snapshot))
}

fn load_activities(conn: &Connection) -> Result<ActivityStore, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT tab_id, url, title, category, start_time, duration_ms
        FROM activities
        ORDER BY seq ASC
        ",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, u64>(5)?,
        ))
    })?;
    let mut records = Vec::new();
    for row in rows {
        let (tab_id, url, title, category, start_time, duration_ms) = row?;
        records.push(ActivityRecord {
            tab_id: TabId::new(tab_id).map_err(|err| invalid_row("activities", &err))?,
            url,
            title,
            category: Category::new(category).map_err(|err| invalid_row("activities", &err))?,
            start_time: parse_timestamp("activities", &start_time)?,
            duration_ms,
        });
    }
    Ok(records.into_iter().collect())
}

fn load_daily_stats(conn: &Connection) -> Result<DailyStats, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT date, category, total_ms, visit_count
        FROM daily_stats
        ORDER BY date ASC, category ASC
        ",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u64>(2)?,
            row.get::<_, u64>(3)?,
        ))
    })?;
    let mut buckets: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();
    for row in rows {
        let (date, category, total_ms, visit_count) = row?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|source| {
            DbError::TimestampParse {
                table: "daily_stats",
                timestamp: date.clone(),
                source,
            }
        })?;
        let category =
            Category::new(category).map_err(|err| invalid_row("daily_stats", &err))?;
        buckets
            .entry(date)
            .or_insert_with(|| DailyBucket::new(date))
            .categories
            .insert(
                category,
                CategoryTotals {
                    total_ms,
                    visit_count,
                },
            );
    }
    Ok(buckets.into_values().collect())
}

fn load_settings(conn: &Connection) -> Result<Settings, DbError> {
    let mut merged = match serde_json::to_value(Settings::default()) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(source) => {
            return Err(DbError::Settings {
                key: "defaults".to_string(),
                source,
            });
        }
    };

    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (key, raw) = row?;
        if !merged.contains_key(&key) {
            tracing::warn!(key, "ignoring unknown settings key");
            continue;
        }
        let value: Value =
            serde_json::from_str(&raw).map_err(|source| DbError::Settings {
                key: key.clone(),
                source,
            })?;
        merged.insert(key, value);
    }

    serde_json::from_value(Value::Object(merged)).map_err(|source| DbError::Settings {
        key: "settings".to_string(),
        source,
    })
}

/// Replaces the stored snapshot and bumps the version. Caller owns the transaction.
fn store(conn: &Connection, snapshot: &Snapshot, now: DateTime<Utc>) -> Result<i64, DbError> {
    conn.execute("DELETE FROM activities", [])?;
    {
        let mut stmt = conn.prepare(
            "
            INSERT INTO activities (tab_id, url, title, category, start_time, duration_ms, date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )?;
        for record in snapshot.activities.records() {
            stmt.execute(params![
                record.tab_id.as_str(),
                record.url,
                record.title,
                record.category.as_str(),
                format_timestamp(record.start_time),
                record.duration_ms,
                format_date(record.date()),
            ])?;
        }
    }

    conn.execute("DELETE FROM daily_stats", [])?;
    {
        let mut stmt = conn.prepare(
            "
            INSERT INTO daily_stats (date, category, total_ms, visit_count)
            VALUES (?, ?, ?, ?)
            ",
        )?;
        for bucket in snapshot.daily_stats.buckets() {
            let date = format_date(bucket.date);
            for (category, totals) in &bucket.categories {
                stmt.execute(params![
                    date,
                    category.as_str(),
                    totals.total_ms,
                    totals.visit_count,
                ])?;
            }
        }
    }

    let settings = serde_json::to_value(&snapshot.settings).map_err(|source| DbError::Settings {
        key: "settings".to_string(),
        source,
    })?;
    if let Value::Object(map) = settings {
        let mut stmt = conn.prepare(
            "
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )?;
        for (key, value) in map {
            stmt.execute(params![key, value.to_string()])?;
        }
    }

    conn.execute(
        "UPDATE snapshot_meta SET version = version + 1, updated_at = ? WHERE id = 1",
        params![format_timestamp(now)],
    )?;
    current_version(conn)
}

fn invalid_row(table: &'static str, err: &dyn std::error::Error) -> DbError {
    DbError::InvalidRow {
        table,
        message: err.to_string(),
    }
}

fn parse_timestamp(table: &'static str, value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            timestamp: value.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
