//! Canonical location sample value object.

use serde::{Deserialize, Serialize};

/// A single positional sample, produced only by the geo sampler.
///
/// Immutable once created. `timestamp_ms` is the provider-supplied fix
/// time in epoch milliseconds, never the wall clock at receipt, so that
/// staleness computation is sample-age-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, if reported.
    #[serde(rename = "accuracy", skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    /// Heading in degrees clockwise from true north, if reported.
    #[serde(rename = "heading", skip_serializing_if = "Option::is_none")]
    pub heading_deg: Option<f64>,
    /// Ground speed in meters per second, if reported.
    #[serde(rename = "speed", skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    /// Fix time in epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

impl LocationSample {
    /// Age of this sample relative to `now_ms`, in milliseconds.
    /// A sample timestamped in the future has age zero.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.timestamp_ms).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> LocationSample {
        LocationSample {
            latitude: 35.51,
            longitude: 139.47,
            accuracy_m: Some(12.0),
            heading_deg: None,
            speed_mps: None,
            timestamp_ms: ts,
        }
    }

    #[test]
    fn test_age_clamps_future_timestamps() {
        let s = sample(10_000);
        assert_eq!(s.age_ms(15_000), 5_000);
        assert_eq!(s.age_ms(5_000), 0);
    }

    #[test]
    fn test_serde_uses_wire_names_and_omits_missing() {
        let s = sample(1);
        let json = serde_json::to_value(&s).expect("serialize");
        assert!(json.get("accuracy").is_some());
        assert!(json.get("heading").is_none());
        assert_eq!(json["timestamp"], 1);
    }
}
