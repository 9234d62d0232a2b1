//! Time utilities and constants for RateSync.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Timing defaults.
pub mod constants {
    use super::Duration;

    /// Default sync interval and rate freshness window (24 hours).
    pub fn default_sync_interval() -> Duration {
        Duration::hours(24)
    }

    /// Default symbol freshness window (180 days).
    pub fn default_symbols_ttl() -> Duration {
        Duration::hours(4320)
    }

    /// Default per-request timeout for provider calls (20 seconds).
    pub fn default_fetch_timeout() -> Duration {
        Duration::seconds(20)
    }
}

/// A timestamp with timezone (always UTC for RateSync).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp the way stores write `fetched_at`.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339()
}

/// Parse a stored fetch timestamp.
///
/// Accepts RFC 3339 / ISO 8601 with an offset, and ISO 8601 without one
/// (`T` or space separated). A value without an offset is taken to be UTC
/// already. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

/// Whether something fetched at `fetched_at` is still inside `ttl` at `now`.
///
/// Strict: an age of exactly `ttl` is stale.
pub fn is_within_ttl(fetched_at: Timestamp, now: Timestamp, ttl: Duration) -> bool {
    now.signed_duration_since(fetched_at) < ttl
}
