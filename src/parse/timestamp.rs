use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Format a timestamp the way it is persisted: UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp.
///
/// Tries, in order:
/// 1. RFC 3339 with fractional seconds (`2026-01-09T10:00:00.250Z`)
/// 2. RFC 3339 at second precision (`2026-01-09T10:00:00Z`, `...+08:00`)
/// 3. zone-less `YYYY-MM-DDTHH:MM:SS[.fff]`, read as UTC
///
/// Returns `None` when every format fails.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Some(ts) = parse_fractional(s) {
        return Some(ts);
    }
    if let Some(ts) = parse_whole_seconds(s) {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_fractional(s: &str) -> Option<DateTime<Utc>> {
    if !s.contains('.') {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_whole_seconds(s: &str) -> Option<DateTime<Utc>> {
    if s.contains('.') {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
