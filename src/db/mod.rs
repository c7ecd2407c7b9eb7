pub mod cache;
pub mod postgres;

pub use cache::{Cache, CacheKey, CacheStore, MemoryStore, RedisStore};
pub use postgres::{create_pool, PgCatalog};
