//! Roster member entity model.

use serde::{Deserialize, Serialize};

use beacon_core::types::MemberId;

use crate::location::LocationSample;

/// A tracked person on the current user's roster.
///
/// The `id` is assigned by the roster store on creation (or locally
/// generated in degraded mode) and is immutable for the entry's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    /// Unique roster entry identifier.
    pub id: MemberId,
    /// Display name.
    pub name: String,
    /// Phone number, digits only (normalized at creation).
    pub phone: String,
    /// Relationship to the current user (e.g., "mother").
    pub relation: String,
    /// Avatar identifier or URL.
    pub avatar: String,
    /// Whether this member is currently sharing their location.
    pub is_location_shared: bool,
    /// Fix time of the sample stored in `location`, epoch milliseconds.
    /// Always the sample's own timestamp, never the write time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_location_update: Option<i64>,
    /// Last shared location, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationSample>,
}

impl FamilyMember {
    /// The location this member is effectively sharing right now.
    ///
    /// A stored `location` is only meaningful while `is_location_shared`
    /// is set; stale data from a previous sharing period must not be
    /// surfaced as current.
    pub fn effective_location(&self) -> Option<&LocationSample> {
        if self.is_location_shared {
            self.location.as_ref()
        } else {
            None
        }
    }

    /// Return a copy safe to hand to consumers: the stored `location` is
    /// cleared unless the member is actively sharing.
    pub fn gated(mut self) -> Self {
        if !self.is_location_shared {
            self.location = None;
        }
        self
    }
}

/// Data required to create a new roster entry.
///
/// `name` and `phone` non-emptiness is enforced by the caller; the engine
/// normalizes `phone` to digits and assigns sharing defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    /// Display name.
    pub name: String,
    /// Phone number in any human format.
    pub phone: String,
    /// Relationship to the current user.
    pub relation: String,
    /// Avatar identifier or URL.
    pub avatar: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(shared: bool, with_location: bool) -> FamilyMember {
        FamilyMember {
            id: MemberId::new("m1"),
            name: "Ann".to_string(),
            phone: "5551112222".to_string(),
            relation: "sister".to_string(),
            avatar: String::new(),
            is_location_shared: shared,
            last_location_update: with_location.then_some(1_000),
            location: with_location.then_some(LocationSample {
                latitude: 1.0,
                longitude: 2.0,
                accuracy_m: None,
                heading_deg: None,
                speed_mps: None,
                timestamp_ms: 1_000,
            }),
        }
    }

    #[test]
    fn test_effective_location_gated_by_sharing_flag() {
        assert!(member(true, true).effective_location().is_some());
        assert!(member(false, true).effective_location().is_none());
        assert!(member(true, false).effective_location().is_none());
    }

    #[test]
    fn test_gated_clears_location_when_not_sharing() {
        let gated = member(false, true).gated();
        assert!(gated.location.is_none());
        let kept = member(true, true).gated();
        assert!(kept.location.is_some());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_value(member(true, false)).expect("serialize");
        assert!(json.get("isLocationShared").is_some());
        assert!(json.get("location").is_none());
    }
}
