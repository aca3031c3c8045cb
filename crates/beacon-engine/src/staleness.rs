//! Sample-age classification for presence display.
//!
//! Staleness is computed from the sample's own fix time, never the
//! write time, so classification reflects sample age rather than
//! write latency. The thresholds are fixed constants shared with the
//! presentation layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Age below which a sample is reported as `"live"`.
pub const LIVE_THRESHOLD: Duration = Duration::from_secs(60);
/// Age boundary between minute and hour labels.
pub const HOUR_THRESHOLD: Duration = Duration::from_secs(60 * 60);
/// Marker stays fresh below this age.
pub const FRESH_THRESHOLD: Duration = Duration::from_secs(5 * 60);
/// Marker is aging up to (and including) this age, stale beyond it.
pub const AGING_THRESHOLD: Duration = Duration::from_secs(30 * 60);

/// Marker freshness bucket for map display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Under five minutes old.
    Fresh,
    /// Five to thirty minutes old.
    Aging,
    /// Over thirty minutes old.
    Stale,
}

fn age(now_ms: i64, last_update_ms: i64) -> Duration {
    Duration::from_millis(now_ms.saturating_sub(last_update_ms).max(0) as u64)
}

/// Human-readable age label: `"live"`, `"{n}m ago"`, or `"{n}h ago"`.
pub fn age_label(now_ms: i64, last_update_ms: i64) -> String {
    let age = age(now_ms, last_update_ms);
    if age < LIVE_THRESHOLD {
        "live".to_string()
    } else if age < HOUR_THRESHOLD {
        format!("{}m ago", age.as_secs() / 60)
    } else {
        format!("{}h ago", age.as_secs() / 3600)
    }
}

/// Marker freshness bucket for a sample of the given age.
pub fn freshness(now_ms: i64, last_update_ms: i64) -> Freshness {
    let age = age(now_ms, last_update_ms);
    if age < FRESH_THRESHOLD {
        Freshness::Fresh
    } else if age <= AGING_THRESHOLD {
        Freshness::Aging
    } else {
        Freshness::Stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE_MS: i64 = 60 * 1000;

    #[test]
    fn test_under_a_minute_is_live() {
        assert_eq!(age_label(30_000, 0), "live");
        assert_eq!(age_label(59_999, 0), "live");
    }

    #[test]
    fn test_minute_labels() {
        assert_eq!(age_label(5 * MINUTE_MS, 0), "5m ago");
        assert_eq!(age_label(59 * MINUTE_MS + 59_000, 0), "59m ago");
    }

    #[test]
    fn test_hour_labels() {
        assert_eq!(age_label(60 * MINUTE_MS, 0), "1h ago");
        assert_eq!(age_label(90 * MINUTE_MS, 0), "1h ago");
        assert_eq!(age_label(150 * MINUTE_MS, 0), "2h ago");
    }

    #[test]
    fn test_future_sample_is_live() {
        assert_eq!(age_label(0, 10_000), "live");
    }

    #[test]
    fn test_marker_freshness_buckets() {
        assert_eq!(freshness(4 * MINUTE_MS, 0), Freshness::Fresh);
        assert_eq!(freshness(5 * MINUTE_MS, 0), Freshness::Aging);
        assert_eq!(freshness(30 * MINUTE_MS, 0), Freshness::Aging);
        assert_eq!(freshness(31 * MINUTE_MS, 0), Freshness::Stale);
    }
}
