//! Self-presence value objects.

use serde::{Deserialize, Serialize};

use beacon_core::types::UserId;

use crate::location::LocationSample;

/// The current user's own last-known location, as mirrored to the local
/// presence cache under `user_location_{uid}`.
///
/// Self-location is never written into the roster; it lives in the user's
/// own store document and in this cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfLocationRecord {
    /// Owner of the location.
    pub user_id: UserId,
    /// The sample itself.
    pub location: LocationSample,
    /// Fix time of `location`, epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

impl SelfLocationRecord {
    /// Build a record from a sample, carrying the sample's own fix time.
    pub fn new(user_id: UserId, location: LocationSample) -> Self {
        let timestamp_ms = location.timestamp_ms;
        Self {
            user_id,
            location,
            timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_carries_sample_time() {
        let sample = LocationSample {
            latitude: 1.0,
            longitude: 2.0,
            accuracy_m: None,
            heading_deg: None,
            speed_mps: None,
            timestamp_ms: 42,
        };
        let record = SelfLocationRecord::new(UserId::new("u1"), sample);
        assert_eq!(record.timestamp_ms, 42);
    }
}
