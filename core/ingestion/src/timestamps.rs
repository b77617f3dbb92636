//! Strict timestamp normalization for source records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a date-only value (`YYYY-MM-DD`, taken as UTC midnight) or a full
/// RFC 3339 timestamp with offset.
pub fn parse_date_or_instant(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty date".to_string());
    }

    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(day.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    parse_instant(s)
}

/// Parse an RFC 3339 timestamp. Values without a UTC offset are rejected as
/// ambiguous rather than guessed.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
        return Err(format!("timestamp {:?} has no UTC offset", s));
    }

    Err(format!("unparseable timestamp {:?}", s))
}
