// ============================================================================
// Lookaside Cache
// ============================================================================
//
// A non-authoritative key/value store with per-entry TTL. A missing entry
// means "not cached", never "does not exist".
//
// - OrderCache:  the key/value capability (Redis or in-memory)
// - CacheAside:  the order-specific policy on top (keys, TTL, encoding,
//                degraded mode when the cache is down)
//
// ============================================================================

mod memory;
mod policy;
mod redis_cache;

pub use memory::MemoryCache;
pub use policy::{CacheAside, CachedRead, DEFAULT_TTL};
pub use redis_cache::{RedisCache, RedisCacheSettings};

use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache circuit breaker is open")]
    CircuitOpen,

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    /// True when the connection that produced this error should not be reused.
    /// A timeout counts: a peer that stops answering without closing the socket
    /// would otherwise keep every later call hanging until its own timeout.
    pub fn invalidates_connection(&self) -> bool {
        match self {
            CacheError::Timeout(_) => true,
            CacheError::Redis(e) => e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal(),
            CacheError::CircuitOpen | CacheError::Unavailable(_) => false,
        }
    }
}

#[async_trait]
pub trait OrderCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn evict(&self, key: &str) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;

    /// True while the client is short-circuiting calls after repeated failures.
    async fn is_degraded(&self) -> bool {
        false
    }
}
