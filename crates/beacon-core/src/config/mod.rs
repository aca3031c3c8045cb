//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod cache;
pub mod geo;
pub mod geocoder;
pub mod logging;
pub mod store;

use serde::{Deserialize, Serialize};

use self::cache::CacheConfig;
use self::geo::GeoConfig;
use self::geocoder::GeocoderConfig;
use self::logging::LoggingConfig;
use self::store::StoreConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay). Every
/// section falls back to its defaults when absent, so a missing config
/// file yields a fully usable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Device location sampling settings.
    #[serde(default)]
    pub geo: GeoConfig,
    /// Local presence cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Remote roster store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Reverse geocoder settings.
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `BEACON__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BEACON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_complete() {
        let config = AppConfig::default();
        assert_eq!(config.cache.provider, "file");
        assert_eq!(config.store.backend, "memory");
        assert!(!config.geocoder.enabled);
    }
}
