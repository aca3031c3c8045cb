//! Reverse geocoder configuration.

use serde::{Deserialize, Serialize};

/// Reverse geocoding configuration. The geocoder is optional; when
/// disabled, alerts are dispatched without a resolved address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Whether reverse geocoding is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the reverse geocoding API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_timeout() -> u64 {
    5
}
