//! Remote roster store configuration.

use serde::{Deserialize, Serialize};

/// Top-level roster store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend type: `"http"` or `"memory"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// HTTP backend configuration.
    #[serde(default)]
    pub http: HttpStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            http: HttpStoreConfig::default(),
        }
    }
}

/// HTTP document-store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpStoreConfig {
    /// Base URL of the document store API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8791/v1".to_string()
}

fn default_timeout() -> u64 {
    10
}
