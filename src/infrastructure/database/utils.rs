//! Database utility functions.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a stored timestamp, accepting RFC 3339 (the format this crate
/// writes) and SQLite's default `YYYY-MM-DD HH:MM:SS` form.
///
/// # Examples
/// ```
/// use signoff::infrastructure::database::utils::parse_datetime;
///
/// let a = parse_datetime("2026-03-01T09:30:00Z").unwrap();
/// let b = parse_datetime("2026-03-01 09:30:00").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
