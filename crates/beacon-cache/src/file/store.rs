//! File-backed cache implementation.
//!
//! The whole key/value map is held in memory and rewritten to a JSON
//! file on every mutation (atomic write-then-rename), so cached presence
//! state survives process restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use beacon_core::config::cache::FileCacheConfig;
use beacon_core::error::AppError;
use beacon_core::result::AppResult;
use beacon_core::traits::cache::CacheProvider;

/// File-backed cache provider.
#[derive(Debug)]
pub struct FileCacheProvider {
    /// Path of the persisted JSON map.
    path: PathBuf,
    /// In-memory view of the persisted map.
    entries: Mutex<HashMap<String, String>>,
}

impl FileCacheProvider {
    /// Open (or create) the cache file at the configured path.
    ///
    /// A missing file starts an empty cache; an unreadable or corrupt
    /// file is logged and treated as empty rather than failing startup.
    pub async fn open(config: &FileCacheConfig) -> AppResult<Self> {
        let path = PathBuf::from(&config.path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::cache(format!(
                    "Failed to create cache directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cache file corrupt; starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache file unreadable; starting empty");
                HashMap::new()
            }
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened file cache");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Persist the current map atomically (write temp file, then rename).
    async fn persist(path: &Path, entries: &HashMap<String, String>) -> AppResult<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| AppError::cache(format!("Failed to write cache file: {e}")))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| AppError::cache(format!("Failed to replace cache file: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl CacheProvider for FileCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        Self::persist(&self.path, &entries).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            Self::persist(&self.path, &entries).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.entries.lock().await.contains_key(key))
    }

    async fn health_check(&self) -> AppResult<bool> {
        let entries = self.entries.lock().await;
        Self::persist(&self.path, &entries).await?;
        Ok(true)
    }

    async fn flush_all(&self) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        Self::persist(&self.path, &entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> FileCacheConfig {
        let dir = std::env::temp_dir().join(format!("beacon-cache-{}", uuid::Uuid::new_v4()));
        FileCacheConfig {
            path: dir.join("presence.json").to_string_lossy().into_owned(),
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let config = temp_config();
        let provider = FileCacheProvider::open(&config).await.unwrap();
        provider.set("k", "v").await.unwrap();
        assert_eq!(provider.get("k").await.unwrap(), Some("v".to_string()));
        provider.delete("k").await.unwrap();
        assert_eq!(provider.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let config = temp_config();
        {
            let provider = FileCacheProvider::open(&config).await.unwrap();
            provider.set("isLocationSharing", "true").await.unwrap();
        }
        let reopened = FileCacheProvider::open(&config).await.unwrap();
        assert_eq!(
            reopened.get("isLocationSharing").await.unwrap(),
            Some("true".to_string())
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let config = temp_config();
        let path = PathBuf::from(&config.path);
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, b"not json").await.unwrap();
        let provider = FileCacheProvider::open(&config).await.unwrap();
        assert_eq!(provider.get("anything").await.unwrap(), None);
    }
}
