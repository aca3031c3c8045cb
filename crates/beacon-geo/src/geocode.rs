//! Reverse geocoding — resolves a human-readable address for a point.
//!
//! Optional collaborator: failure is never fatal. Callers treat a `None`
//! or an error as "no address available".

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use beacon_core::config::geocoder::GeocoderConfig;
use beacon_core::error::AppError;
use beacon_core::result::AppResult;

/// Trait for reverse geocoding backends.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve an address for a point. `Ok(None)` means the service
    /// answered but knows no address for the point.
    async fn reverse(&self, latitude: f64, longitude: f64) -> AppResult<Option<String>>;
}

/// Response body of the reverse geocoding API.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// HTTP reverse geocoder (Nominatim-compatible API).
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGeocoder {
    /// Create a new geocoder client from configuration.
    pub fn new(config: &GeocoderConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for HttpGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> AppResult<Option<String>> {
        let url = format!(
            "{}/reverse?lat={latitude}&lon={longitude}&format=jsonv2",
            self.base_url
        );
        let response: ReverseResponse = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::remote_read(format!("reverse geocode failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::remote_read(format!("reverse geocode failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::remote_read(format!("reverse geocode decode failed: {e}")))?;

        Ok(response.display_name)
    }
}
