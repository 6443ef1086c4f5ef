//! Time and timestamp utilities

use chrono::{DateTime, Local, TimeZone, Timelike, Utc};

/// Elapsed seconds from `from` to `to` (negative if `to` is earlier)
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from)
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| (to - from).num_milliseconds() as f64 / 1_000.0)
}

/// Hour of day (0-23) in the local calendar
pub fn local_hour(timestamp: DateTime<Utc>) -> u32 {
    timestamp.with_timezone(&Local).hour()
}

/// Parse a point in time given as RFC 3339 or unix seconds
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let secs = raw.parse::<f64>().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1_000_000_000.0) as u32;
    Utc.timestamp_opt(whole, nanos).single()
}
