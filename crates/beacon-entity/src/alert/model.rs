//! Emergency alert entity model.

use serde::{Deserialize, Serialize};

use beacon_core::types::UserId;

use crate::location::LocationSample;

/// Category of an emergency alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Generic SOS.
    Sos,
    /// Medical emergency.
    Medical,
    /// Fire.
    Fire,
    /// Police assistance needed.
    Police,
}

impl AlertKind {
    /// Parses from a string with a default fallback.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "medical" => Self::Medical,
            "fire" => Self::Fire,
            "police" => Self::Police,
            _ => Self::Sos,
        }
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sos => "sos",
            Self::Medical => "medical",
            Self::Fire => "fire",
            Self::Police => "police",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An emergency alert document, written to the per-user alert collection.
///
/// The document id and the `createdAt` creation time are assigned by the
/// roster store; `timestamp_ms` is the composition time on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAlert {
    /// Alert category.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Location attached to the alert.
    pub location: LocationSample,
    /// Free-form message.
    pub message: String,
    /// Composition time in epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    /// The user who raised the alert.
    pub user_id: UserId,
    /// Reverse-geocoded address, when resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
