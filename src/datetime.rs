//! Date/time utilities for depot.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a timestamp stored by SQLite's `datetime('now')` (UTC).
///
/// RFC 3339 strings are accepted too.
pub fn parse_sqlite_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert a SQLite datetime string to RFC 3339.
///
/// Unparseable input is returned unchanged.
pub fn to_rfc3339(datetime_str: &str) -> String {
    match parse_sqlite_datetime(datetime_str) {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        None => datetime_str.to_string(),
    }
}
