//! In-memory cache implementation using the moka crate.
//!
//! Does not survive process restarts; used by tests and ephemeral
//! deployments where durable presence state is not required.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use beacon_core::config::cache::MemoryCacheConfig;
use beacon_core::result::AppResult;
use beacon_core::traits::cache::CacheProvider;

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache.
    cache: Cache<String, String>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn flush_all(&self) -> AppResult<()> {
        self.cache.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::config::cache::MemoryCacheConfig;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig {
            max_capacity: 1000,
            time_to_live_seconds: 60,
        })
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider();
        provider.set("key1", "value1").await.unwrap();
        let val = provider.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let provider = make_provider();
        provider.set("key2", "value2").await.unwrap();
        provider.delete("key2").await.unwrap();
        let val = provider.get("key2").await.unwrap();
        assert_eq!(val, None);
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let provider = make_provider();
        let data = serde_json::json!({"name": "test", "count": 42});
        provider.set_json("json_key", &data).await.unwrap();
        let result: Option<serde_json::Value> = provider.get_json("json_key").await.unwrap();
        assert_eq!(result, Some(data));
    }

    #[tokio::test]
    async fn test_flush_all() {
        let provider = make_provider();
        provider.set("k", "v").await.unwrap();
        provider.flush_all().await.unwrap();
        assert_eq!(provider.get("k").await.unwrap(), None);
    }
}
