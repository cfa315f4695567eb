//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(second|minute|hour|day)s?\s+ago$").unwrap());

/// Largest relative offset accepted, in seconds (~100 years).
const MAX_RELATIVE_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// Parses an instant as RFC 3339 or as "N units ago" relative to `now`.
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s.trim()) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use RFC 3339 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '5 minutes ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;
    let seconds_per_unit = match &caps[2] {
        "second" => 1,
        "minute" => 60,
        "hour" => 60 * 60,
        "day" => 24 * 60 * 60,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };
    let seconds = n
        .checked_mul(seconds_per_unit)
        .filter(|seconds| *seconds <= MAX_RELATIVE_SECONDS)
        .with_context(|| format!("Relative time value too large: {s}"))?;

    Ok(now - Duration::seconds(seconds))
}

/// Parses a UTC calendar day: `YYYY-MM-DD`, `today` or `yesterday`.
pub fn parse_date(s: &str, now: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let today = now.date_naive();
    match s.trim() {
        "today" => Ok(today),
        "yesterday" => today.pred_opt().context("date out of range"),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {other}. Use YYYY-MM-DD, today or yesterday")),
    }
}

/// Formats milliseconds as `Xh Ym`, or `Ym` under an hour, rounded to the
/// nearest minute.
pub fn format_duration(ms: u64) -> String {
    let total_minutes = ms.saturating_add(30_000) / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// `1 visit`, `3 visits`.
pub fn plural(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
