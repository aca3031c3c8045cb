//! Device location provider trait.
//!
//! The provider is the platform-specific, permission-gated source of
//! positional fixes. The [`LocationProvider`] trait is defined here in
//! `beacon-core` and implemented in `beacon-geo` (simulated provider) or
//! by platform integrations.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

use crate::result::AppResult;

/// A raw positional fix as delivered by the device location provider.
///
/// `timestamp_ms` is the provider-supplied epoch-millisecond time of the
/// fix, not the wall clock at receipt.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawFix {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, if reported.
    pub accuracy_m: Option<f64>,
    /// Heading in degrees clockwise from true north, if reported.
    pub heading_deg: Option<f64>,
    /// Ground speed in meters per second, if reported.
    pub speed_mps: Option<f64>,
    /// Provider-supplied fix time in epoch milliseconds.
    pub timestamp_ms: i64,
}

/// Result of a permission request.
///
/// Foreground permission is required for any sampling; background
/// permission is best-effort and its denial degrades to foreground-only
/// sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PermissionGrant {
    /// Whether foreground location access was granted.
    pub foreground: bool,
    /// Whether background location access was granted.
    pub background: bool,
}

/// Requested accuracy profile for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyProfile {
    /// Best available accuracy (GNSS).
    High,
    /// Balanced power/accuracy.
    Balanced,
    /// Coarse, low-power positioning.
    Low,
}

impl AccuracyProfile {
    /// Parses from a string with a default fallback.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Balanced,
        }
    }

    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "high",
            Self::Balanced => "balanced",
            Self::Low => "low",
        }
    }
}

/// Options for a continuous fix subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionOptions {
    /// Requested accuracy profile.
    pub accuracy: AccuracyProfile,
    /// Minimum interval between delivered fixes.
    pub min_interval: Duration,
    /// Minimum movement between delivered fixes, in meters.
    pub min_distance_m: f64,
}

/// A stream of raw fixes delivered until the subscription is cancelled.
pub type FixStream = Pin<Box<dyn Stream<Item = RawFix> + Send>>;

/// Trait for device location providers.
#[async_trait]
pub trait LocationProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "simulated").
    fn provider_type(&self) -> &str;

    /// Request foreground (and, when `background` is set, background)
    /// location permission. Denial is expressed in the returned grant,
    /// not as an error.
    async fn request_permission(&self, background: bool) -> AppResult<PermissionGrant>;

    /// One-shot fix. A provider-cached fix no older than `max_age` may
    /// satisfy the call; otherwise the provider must produce a fresh fix
    /// within `timeout`.
    async fn current_fix(&self, timeout: Duration, max_age: Duration) -> AppResult<RawFix>;

    /// Open a continuous fix stream honoring the given options.
    async fn open_stream(&self, options: SubscriptionOptions) -> AppResult<FixStream>;
}
