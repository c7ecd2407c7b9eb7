use moka::sync::Cache as MokaCache;
use moka::Expiry;
use std::time::{Duration, Instant};

use super::CacheStore;
use crate::error::AppResult;

#[derive(Clone)]
struct StoredEntry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, StoredEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache store
///
/// Entries live in this process only, so it is suitable for single-instance
/// deployments. Capacity is bounded; the least recently used entries are
/// evicted first.
#[derive(Clone)]
pub struct MemoryStore {
    entries: MokaCache<String, StoredEntry>,
}

impl MemoryStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: MokaCache::builder()
                .max_capacity(capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value))
    }

    fn set(&self, key: String, value: String, ttl: Duration) -> AppResult<()> {
        self.entries.insert(key, StoredEntry { value, ttl });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
