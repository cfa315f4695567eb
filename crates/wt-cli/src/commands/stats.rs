//! Stats command for showing one day's time per category.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use wt_core::{DailyBucket, SnapshotStore, Tracker};

use super::util::{format_duration, plural};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayReport<'a> {
    date: NaiveDate,
    total_time: u64,
    visit_count: u64,
    categories: Vec<CategoryRow<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRow<'a> {
    category: &'a str,
    total_time: u64,
    visit_count: u64,
}

impl<'a> DayReport<'a> {
    fn new(date: NaiveDate, bucket: Option<&'a DailyBucket>) -> Self {
        let Some(bucket) = bucket else {
            return Self {
                date,
                total_time: 0,
                visit_count: 0,
                categories: Vec::new(),
            };
        };
        Self {
            date,
            total_time: bucket.total_ms(),
            visit_count: bucket.visit_count(),
            categories: bucket
                .breakdown()
                .into_iter()
                .map(|(category, totals)| CategoryRow {
                    category: category.as_str(),
                    total_time: totals.total_ms,
                    visit_count: totals.visit_count,
                })
                .collect(),
        }
    }
}

pub fn run<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &Tracker<S>,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let bucket = tracker.daily_bucket(date)?;
    let report = DayReport::new(date, bucket.as_ref());

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    if report.categories.is_empty() {
        writeln!(writer, "No activity recorded on {date}.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{date}: {} across {}",
        format_duration(report.total_time),
        plural(report.visit_count, "visit")
    )?;
    for row in &report.categories {
        writeln!(
            writer,
            "  {:<16}{:>8}  {}",
            row.category,
            format_duration(row.total_time),
            plural(row.visit_count, "visit")
        )?;
    }
    Ok(())
}
