//! Device location sampling configuration.

use serde::{Deserialize, Serialize};

/// Location sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Accuracy profile requested from the provider: `"high"`, `"balanced"`,
    /// or `"low"`.
    #[serde(default = "default_accuracy")]
    pub accuracy: String,
    /// Minimum interval between delivered samples in milliseconds.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Minimum movement between delivered samples in meters.
    #[serde(default = "default_min_distance_m")]
    pub min_distance_m: f64,
    /// Deadline for a one-shot location request in milliseconds.
    #[serde(default = "default_one_shot_timeout_ms")]
    pub one_shot_timeout_ms: u64,
    /// Maximum age of a provider-cached fix that may satisfy a one-shot
    /// request, in milliseconds.
    #[serde(default = "default_max_sample_age_ms")]
    pub max_sample_age_ms: u64,
    /// Whether to also request background permission. Denial degrades to
    /// foreground-only sampling.
    #[serde(default = "default_true")]
    pub request_background: bool,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy(),
            min_interval_ms: default_min_interval_ms(),
            min_distance_m: default_min_distance_m(),
            one_shot_timeout_ms: default_one_shot_timeout_ms(),
            max_sample_age_ms: default_max_sample_age_ms(),
            request_background: default_true(),
        }
    }
}

fn default_accuracy() -> String {
    "balanced".to_string()
}

fn default_min_interval_ms() -> u64 {
    5000
}

fn default_min_distance_m() -> f64 {
    10.0
}

fn default_one_shot_timeout_ms() -> u64 {
    10_000
}

fn default_max_sample_age_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}
