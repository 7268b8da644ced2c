//! Staleness guard: posts older than the horizon are never classified.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

pub const DEFAULT_HORIZON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Stale,
    /// Timestamp could not be parsed; treated as fresh.
    Unparsable,
}

/// Classify a post timestamp relative to `now`.
///
/// A post published exactly `horizon_days` ago is still fresh. A horizon
/// reaching past the representable date range makes nothing stale.
pub fn check_staleness(timestamp: &str, now: DateTime<Utc>, horizon_days: i64) -> Staleness {
    let Some(published) = parse_timestamp(timestamp) else {
        return Staleness::Unparsable;
    };

    let cutoff = Duration::try_days(horizon_days).and_then(|horizon| now.checked_sub_signed(horizon));
    match cutoff {
        Some(cutoff) if published < cutoff => Staleness::Stale,
        _ => Staleness::Fresh,
    }
}

/// Unparsable timestamps are not stale.
pub fn is_stale(timestamp: &str, now: DateTime<Utc>, horizon_days: i64) -> bool {
    check_staleness(timestamp, now, horizon_days) == Staleness::Stale
}

/// RFC 3339, or a naive date-time read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
