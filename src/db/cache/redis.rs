use redis::AsyncCommands;
use redis::Client;
use std::time::Duration;
use tokio::sync::mpsc;

use super::CacheStore;
use crate::error::{AppError, AppResult};

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache store
///
/// Reads go straight to Redis. Writes are queued to a background task so a slow
/// or unavailable Redis never delays a response.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl RedisStore {
    /// Creates the store and spawns its background writer task
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let store = Self {
            redis_client,
            write_tx,
        };

        (store, CacheWriterHandle { shutdown_tx })
    }

    /// Drains write messages until shutdown, then flushes whatever is still queued
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(msg) = write_rx.recv().await {
                        match Self::write_to_redis(&client, msg).await {
                            Ok(()) => flushed += 1,
                            Err(e) => tracing::error!(error = %e, "Failed to flush cache write during shutdown"),
                        }
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key).await?;
        Ok(cached)
    }

    fn set(&self, key: String, value: String, ttl: Duration) -> AppResult<()> {
        // SETEX rejects a zero expiry
        let ttl = ttl.as_secs().max(1);
        self.write_tx
            .send(CacheWriteMessage { key, value, ttl })
            .map_err(|e| AppError::Internal(format!("Cache writer unavailable: {}", e)))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

// These tests need a running Redis (REDIS_URL, default localhost)
#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (store, _handle) = RedisStore::new(client);

        let retrieved = store.get("shelfmatch:nonexistent_key_12345").await.unwrap();
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_set_writes_in_background() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (store, _handle) = RedisStore::new(client.clone());

        let key = "shelfmatch:test_async_write".to_string();
        store
            .set(key.clone(), "[1,2]".to_string(), Duration::from_secs(60))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.get(&key).await.unwrap(), Some("[1,2]".to_string()));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_shutdown_flushes_pending_writes() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (store, handle) = RedisStore::new(client.clone());

        let key = "shelfmatch:test_shutdown".to_string();
        store
            .set(key.clone(), "\"flushed\"".to_string(), Duration::from_secs(60))
            .unwrap();

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.get(&key).await.unwrap(), Some("\"flushed\"".to_string()));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(&key).await.unwrap();
    }
}
