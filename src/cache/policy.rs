use std::sync::Arc;
use std::time::Duration;

use super::OrderCache;
use crate::domain::order::Order;
use crate::metrics::{self, MetricsSink};

// ============================================================================
// Cache-Aside Policy for Orders
// ============================================================================
//
// Rules:
// 1. Keys are derived only from the order id ("order:{id}")
// 2. Only single orders fetched by id are cached, with a fixed TTL
// 3. Absent orders are never cached
// 4. The store wins: an entry that does not decode to the requested order
//    is evicted and treated as a miss
// 5. A cache failure never fails the caller; reads fall through to the store
//    and a failed eviction is bounded by the TTL
//
// ============================================================================

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

const CACHE_COUNTER: &str = "orders.cache";

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedRead {
    Hit(Order),
    Miss,
    /// The cache could not be reached; callers should not try to populate it.
    Unavailable,
}

#[derive(Clone)]
pub struct CacheAside {
    cache: Arc<dyn OrderCache>,
    metrics: Arc<dyn MetricsSink>,
    ttl: Duration,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn OrderCache>, metrics: Arc<dyn MetricsSink>, ttl: Duration) -> Self {
        Self { cache, metrics, ttl }
    }

    pub fn key(id: i64) -> String {
        format!("order:{}", id)
    }

    pub async fn lookup(&self, id: i64) -> CachedRead {
        let key = Self::key(id);

        let raw = match self.cache.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record("get", "miss");
                return CachedRead::Miss;
            }
            Err(e) => {
                tracing::warn!(order_id = id, error = %e, "Cache lookup failed, reading from store");
                self.record("get", "error");
                return CachedRead::Unavailable;
            }
        };

        match serde_json::from_str::<Order>(&raw) {
            Ok(order) if order.id == id => {
                tracing::debug!(order_id = id, "Cache hit");
                self.record("get", "hit");
                CachedRead::Hit(order)
            }
            Ok(order) => {
                tracing::warn!(order_id = id, cached_id = order.id, "Cached entry belongs to another order, evicting");
                self.record("get", "error");
                self.invalidate(id).await;
                CachedRead::Miss
            }
            Err(e) => {
                tracing::warn!(order_id = id, error = %e, "Undecodable cache entry, evicting");
                self.record("get", "error");
                self.invalidate(id).await;
                CachedRead::Miss
            }
        }
    }

    /// Store a freshly loaded order. Only called with a value read from the store.
    pub async fn populate(&self, order: &Order) {
        let value = match serde_json::to_string(order) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(order_id = order.id, error = %e, "Failed to encode order for cache");
                return;
            }
        };

        if let Err(e) = self.cache.put(&Self::key(order.id), &value, self.ttl).await {
            tracing::warn!(order_id = order.id, error = %e, "Cache population failed");
            self.record("put", "error");
        } else {
            tracing::debug!(order_id = order.id, ttl_secs = self.ttl.as_secs(), "Cached order");
        }
    }

    /// Drop the cached copy of `id`. Must run only after the store write committed.
    pub async fn invalidate(&self, id: i64) {
        match self.cache.evict(&Self::key(id)).await {
            Ok(()) => tracing::debug!(order_id = id, "Evicted cached order"),
            Err(e) => {
                tracing::error!(
                    order_id = id,
                    error = %e,
                    ttl_secs = self.ttl.as_secs(),
                    "Cache eviction failed, entry stays stale until TTL expiry"
                );
                self.record("evict", "error");
            }
        }
    }

    fn record(&self, operation: &str, outcome: &str) {
        metrics::emit(
            self.metrics.as_ref(),
            CACHE_COUNTER,
            &[("operation", operation), ("outcome", outcome)],
        );
    }
}
