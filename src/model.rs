//! Shared data types: raw page rows, parsed records, and the accumulated set.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fully-parsed, deduplicated listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Source-assigned row id, unique for the life of a sweep.
    pub id: String,
    /// Human-readable label. Empty when the source omits it.
    pub title: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// One row as extracted from the live page, before parsing and dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// ISO-8601-like date string as found on the page.
    pub date: String,
}

/// Everything the extractor sees on the currently loaded page.
///
/// Produced fresh on every poll and superseded immediately after the merge
/// step; never retained across iterations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Rows in page order.
    pub rows: Vec<RawRow>,
    /// Whether a further-page affordance is present.
    pub has_more: bool,
    /// Where the affordance points, when the source exposes it.
    #[serde(default)]
    pub next_url: Option<String>,
}

/// Result of one attempt to advance to the next page.
#[derive(Debug, Clone, Default)]
pub struct NavigationOutcome {
    pub ok: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Parse the source's date string into epoch milliseconds.
///
/// The string is truncated at the first whitespace; sources append auxiliary
/// tokens (such as a raw epoch) after the leading ISO component. Accepts a
/// full date-time or a bare date (taken as midnight UTC).
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let head = raw.split_whitespace().next()?;
    if let Ok(dt) = NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Ordered, deduplicated accumulation of records across pages.
///
/// Order equals first-observed order across the page sequence. The seen-set
/// only ever grows; an id merged once is never appended again even if it
/// reappears on a later page view.
#[derive(Debug, Default)]
pub struct CollectedSet {
    records: Vec<Record>,
    seen: HashSet<String>,
}

impl CollectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Merge one page of rows, in page order, skipping ids already seen.
    ///
    /// Stops mid-page the moment `target` records are held, so the set never
    /// over-collects. Returns how many records this page contributed. Rows
    /// whose date string does not parse are skipped and never count as
    /// progress; their id stays unseen so a later well-formed appearance can
    /// still be collected.
    pub fn merge_page(&mut self, rows: &[RawRow], target: usize) -> usize {
        let mut added = 0;
        for row in rows {
            if self.records.len() >= target {
                break;
            }
            if self.seen.contains(&row.id) {
                continue;
            }
            let Some(timestamp_ms) = parse_timestamp_ms(&row.date) else {
                tracing::debug!(id = %row.id, raw = %row.date, "skipping row with unparseable date");
                continue;
            };
            self.seen.insert(row.id.clone());
            self.records.push(Record {
                id: row.id.clone(),
                title: row.title.clone().unwrap_or_default(),
                timestamp_ms,
            });
            added += 1;
        }
        added
    }
}
