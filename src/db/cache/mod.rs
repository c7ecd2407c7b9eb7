//! Cache-aside layer
//!
//! Responses are cached as JSON under deterministic keys. The cache is never
//! authoritative: read failures and undecodable entries are reported as misses,
//! write failures are logged and dropped.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppResult;

mod macros;
pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisStore};

#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    Search {
        query: String,
        limit: usize,
    },
    HybridRecommendations {
        query: String,
        limit: usize,
        tfidf_weight: f64,
        min_score: u8,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search { query, limit } => write!(f, "search:{}:{}", query, limit),
            CacheKey::HybridRecommendations {
                query,
                limit,
                tfidf_weight,
                min_score,
            } => write!(
                f,
                "hybrid_recommendations:query:{}:{}:{}:{}",
                query, tfidf_weight, limit, min_score
            ),
        }
    }
}

/// Key/value backend with per-entry time-to-live
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores a value without waiting for the backend to acknowledge it
    fn set(&self, key: String, value: String, ttl: Duration) -> AppResult<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

/// Cache handler shared by every request
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Retrieves and decodes a cached value
    ///
    /// Store failures and values that fail to deserialize are treated as a miss.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        let cached = match self.store.get(&key).await {
            Ok(cached) => cached?,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, store = self.store.name(), "Cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&cached) {
            Ok(value) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Stores a value without blocking the caller
    ///
    /// Serialization and store failures are logged and swallowed.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        if let Err(e) = self
            .store
            .set(key.to_string(), json, Duration::from_secs(ttl))
        {
            tracing::error!(error = %e, store = self.store.name(), "Failed to write cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct BrokenStore;

    #[async_trait::async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::Internal("store offline".to_string()))
        }

        fn set(&self, _key: String, _value: String, _ttl: Duration) -> AppResult<()> {
            Err(AppError::Internal("store offline".to_string()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_cache_key_display_search() {
        let key = CacheKey::Search {
            query: "Running Shoes".to_string(),
            limit: 20,
        };
        assert_eq!(format!("{}", key), "search:Running Shoes:20");
    }

    #[test]
    fn test_cache_key_display_hybrid() {
        let key = CacheKey::HybridRecommendations {
            query: "lamp".to_string(),
            limit: 10,
            tfidf_weight: 0.5,
            min_score: 20,
        };
        assert_eq!(format!("{}", key), "hybrid_recommendations:query:lamp:0.5:10:20");
    }

    #[test]
    fn test_cache_key_distinguishes_parameters() {
        let a = CacheKey::HybridRecommendations {
            query: "lamp".to_string(),
            limit: 10,
            tfidf_weight: 0.5,
            min_score: 20,
        };
        let b = CacheKey::HybridRecommendations {
            query: "lamp".to_string(),
            limit: 10,
            tfidf_weight: 0.25,
            min_score: 20,
        };
        assert_ne!(a.to_string(), b.to_string());
    }

    #[tokio::test]
    async fn test_round_trip_through_memory_store() {
        let cache = Cache::new(Arc::new(MemoryStore::new(100)));
        let key = CacheKey::Search {
            query: "hat".to_string(),
            limit: 3,
        };
        let value = vec!["a".to_string(), "b".to_string()];

        cache.set_in_background(&key, &value, 60);

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await;
        assert_eq!(retrieved, Some(value));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new(100));
        let cache = Cache::new(store.clone());
        let key = CacheKey::Search {
            query: "hat".to_string(),
            limit: 3,
        };
        store
            .set(key.to_string(), "not json".to_string(), Duration::from_secs(60))
            .unwrap();

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await;
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_store_failures_are_absorbed() {
        let cache = Cache::new(Arc::new(BrokenStore));
        let key = CacheKey::Search {
            query: "hat".to_string(),
            limit: 3,
        };

        cache.set_in_background(&key, &vec![1, 2, 3], 60);
        let retrieved: Option<Vec<i32>> = cache.get_from_cache(&key).await;
        assert_eq!(retrieved, None);
    }
}
