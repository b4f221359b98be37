//! Lenient calendar-date parsing for request fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::defaults::SNAPSHOT_DATE_FORMAT;

const DATE_FORMATS: &[&str] = &[SNAPSHOT_DATE_FORMAT, "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a date in any of the accepted layouts; time-of-day is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Whole days from `since` to `until` (negative if `since` is later).
pub fn days_between(since: NaiveDate, until: NaiveDate) -> i64 {
    (until - since).num_days()
}
