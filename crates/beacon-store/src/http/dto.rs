//! Wire types for the roster store API.

use serde::{Deserialize, Serialize};

use beacon_entity::location::LocationSample;

/// The user document as read from `users/{uid}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    /// User preference fields.
    #[serde(default)]
    pub preferences: Preferences,
    /// The user's own live location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_location: Option<LocationSample>,
}

/// User preference fields within the user document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Whether ambient location sharing is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_sharing: Option<bool>,
}

/// Response body for document creation endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResponse {
    /// The identifier assigned by the store.
    pub id: String,
}
