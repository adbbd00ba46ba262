use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};

use crate::cache::{CacheAside, CachedRead, OrderCache};
use crate::metrics::{self, MetricsSink};
use crate::store::{OrderStore, UpdateOutcome};
use crate::utils::{Clock, SystemClock};

use super::entity::{NewOrder, Order, OrderDraft};
use super::errors::OrderError;
use super::value_objects::{OrderStatus, Page, PageRequest};

// ============================================================================
// Order Lifecycle Manager
// ============================================================================
//
// Orchestrates: Store (authoritative) → Cache (lookaside) → Metrics
//
// - Reads by id go through the cache; every other read hits the store
// - Writes commit to the store first and evict the cache entry afterwards
// - Status writes are guarded by the status the decision was based on, so a
//   stale cached copy can never push a terminal order out of its state
// - Every mutation emits exactly one counter increment
//
// ============================================================================

pub const RECENT_ORDERS_LIMIT: u32 = 10;

pub struct OrderLifecycleManager {
    store: Arc<dyn OrderStore>,
    cache: CacheAside,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
}

impl OrderLifecycleManager {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: Arc<dyn OrderCache>,
        metrics: Arc<dyn MetricsSink>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache: CacheAside::new(cache, metrics.clone(), cache_ttl),
            metrics,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persist a new order. Every order starts as `Pending` with
    /// `created_at == updated_at`.
    pub async fn create(&self, draft: OrderDraft) -> Result<Order, OrderError> {
        tracing::info!(
            customer_name = %draft.customer_name,
            menu_item = %draft.menu_item,
            "Creating order"
        );

        let order = self.store.insert(NewOrder::from_draft(draft, self.clock.now())).await?;

        metrics::emit(
            self.metrics.as_ref(),
            "orders.created",
            &[("status", order.status.as_str())],
        );
        tracing::info!(order_id = order.id, "✅ Order created");
        Ok(order)
    }

    /// Cache-aside read. Absent orders are reported as `NotFound` and never cached.
    pub async fn get_by_id(&self, id: i64) -> Result<Order, OrderError> {
        let (order, _) = self.read_through(id).await?;
        Ok(order)
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Order>, OrderError> {
        tracing::debug!(page = page.page, size = page.size, "Listing orders");
        Ok(self.store.find_all(page).await?)
    }

    pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
        tracing::debug!(status = %status, "Listing orders by status");
        Ok(self.store.find_by_status(status).await?)
    }

    pub async fn search_by_customer(
        &self,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<Order>, OrderError> {
        tracing::debug!(customer_name = %text, "Searching orders by customer");
        Ok(self.store.find_by_customer_containing(text, page).await?)
    }

    /// The 10 most recently created orders, newest first.
    pub async fn recent_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.find_most_recent(RECENT_ORDERS_LIMIT).await?)
    }

    /// Orders created within `[start, end]`, oldest first.
    pub async fn orders_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, OrderError> {
        tracing::debug!(%start, %end, "Listing orders by creation date");
        Ok(self.store.find_by_date_range(start, end).await?)
    }

    /// Number of orders in each status, in lifecycle order.
    pub async fn status_summary(&self) -> Result<Vec<(OrderStatus, i64)>, OrderError> {
        let mut summary = Vec::with_capacity(OrderStatus::ALL.len());
        for status in OrderStatus::ALL {
            summary.push((status, self.store.count_by_status(status).await?));
        }
        Ok(summary)
    }

    /// Cancel an order. Terminal orders are rejected with `InvalidState`
    /// and left untouched.
    pub async fn cancel(&self, id: i64) -> Result<Order, OrderError> {
        tracing::info!(order_id = id, "Cancelling order");

        let (previous, order) = self.transition(id, OrderStatus::Cancelled, true).await?;

        metrics::emit(
            self.metrics.as_ref(),
            "orders.cancelled",
            &[("from", previous.as_str())],
        );
        tracing::info!(order_id = id, from = %previous, "✅ Order cancelled");
        Ok(order)
    }

    /// Set any status, from any status. No transition graph is enforced here;
    /// only `cancel` guards terminal states.
    pub async fn update_status(&self, id: i64, status: OrderStatus) -> Result<Order, OrderError> {
        tracing::info!(order_id = id, status = %status, "Updating order status");

        let (previous, order) = self.transition(id, status, false).await?;

        metrics::emit(
            self.metrics.as_ref(),
            "orders.status_updated",
            &[("from", previous.as_str()), ("to", status.as_str())],
        );
        tracing::info!(order_id = id, from = %previous, to = %status, "✅ Order status updated");
        Ok(order)
    }

    /// Returns the order and whether it came from the cache.
    async fn read_through(&self, id: i64) -> Result<(Order, bool), OrderError> {
        let lookup = self.cache.lookup(id).await;
        if let CachedRead::Hit(order) = lookup {
            return Ok((order, true));
        }

        let order = self.load_from_store(id).await?;

        // Skip population when the cache just failed; it would only fail again.
        if lookup == CachedRead::Miss {
            self.cache.populate(&order).await;
        }
        Ok((order, false))
    }

    async fn load_from_store(&self, id: i64) -> Result<Order, OrderError> {
        self.store.find_by_id(id).await?.ok_or_else(|| {
            tracing::debug!(order_id = id, "Order not found");
            OrderError::NotFound(id)
        })
    }

    /// Apply `target` to order `id`. Returns the status the change was made
    /// from, along with the stored result.
    async fn transition(
        &self,
        id: i64,
        target: OrderStatus,
        guard_terminal: bool,
    ) -> Result<(OrderStatus, Order), OrderError> {
        let (mut current, from_cache) = self.read_through(id).await?;

        // A cached terminal status is not enough to refuse; confirm it against the store.
        if guard_terminal && from_cache && current.status.is_terminal() {
            self.cache.invalidate(id).await;
            current = self.load_from_store(id).await?;
        }

        let mut conflicted = false;
        loop {
            if guard_terminal && current.status.is_terminal() {
                tracing::warn!(order_id = id, status = %current.status, "Refusing to leave terminal status");
                return Err(OrderError::InvalidState { id, status: current.status });
            }

            // A store failure returns here, before any eviction.
            let outcome = self
                .store
                .update_status(id, current.status, target, self.clock.now())
                .await?;

            // Evict on every answer: on success the entry is outdated, otherwise
            // the store disagreed with what was read.
            self.cache.invalidate(id).await;

            match outcome {
                UpdateOutcome::Updated(order) => return Ok((current.status, order)),
                UpdateOutcome::Missing => return Err(OrderError::NotFound(id)),
                UpdateOutcome::Conflict(_) if conflicted => return Err(OrderError::Conflict(id)),
                UpdateOutcome::Conflict(fresh) => {
                    tracing::warn!(
                        order_id = id,
                        expected = %current.status,
                        actual = %fresh.status,
                        "Status changed underneath, re-deciding against the store"
                    );
                    conflicted = true;
                    current = fresh;
                }
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, DEFAULT_TTL};
    use crate::metrics::{Metrics, MetricsError};
    use crate::store::MemoryOrderStore;

    struct Fixture {
        manager: OrderLifecycleManager,
        store: Arc<MemoryOrderStore>,
        cache: Arc<MemoryCache>,
        metrics: Arc<Metrics>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryOrderStore::new());
        let cache = Arc::new(MemoryCache::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let manager = OrderLifecycleManager::new(store.clone(), cache.clone(), metrics.clone(), DEFAULT_TTL);
        Fixture { manager, store, cache, metrics }
    }

    fn draft() -> OrderDraft {
        OrderDraft::new("Kim", "Fried Chicken", 2, 24000)
    }

    #[tokio::test]
    async fn test_get_by_id_populates_cache_on_miss() {
        let f = fixture();
        let order = f.manager.create(draft()).await.unwrap();
        assert_eq!(f.cache.put_count(), 0);

        let fetched = f.manager.get_by_id(order.id).await.unwrap();
        assert_eq!(fetched, order);
        assert!(f.cache.peek(&CacheAside::key(order.id)).await.is_some());

        f.manager.get_by_id(order.id).await.unwrap();
        assert_eq!(f.cache.put_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_cached_status_is_overridden_by_store() {
        let f = fixture();
        let order = f.manager.create(draft()).await.unwrap();
        f.manager.get_by_id(order.id).await.unwrap(); // cached as Pending

        // Completed behind the cache's back
        f.store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Completed, Utc::now())
            .await
            .unwrap();

        let err = f.manager.cancel(order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidState { status: OrderStatus::Completed, .. }));
        assert!(f.cache.peek(&CacheAside::key(order.id)).await.is_none());
    }

    #[tokio::test]
    async fn test_stale_cached_terminal_status_is_confirmed_before_refusing() {
        let f = fixture();
        let order = f.manager.create(draft()).await.unwrap();
        let mut stale = order.clone();
        stale.status = OrderStatus::Cancelled;
        f.cache
            .put(&CacheAside::key(order.id), &serde_json::to_string(&stale).unwrap(), DEFAULT_TTL)
            .await
            .unwrap();

        let cancelled = f.manager.cancel(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(f.metrics.counter_value("orders.cancelled", &[("from", "PENDING")]), 1);
    }

    #[tokio::test]
    async fn test_update_status_is_permissive() {
        let f = fixture();
        let order = f.manager.create(draft()).await.unwrap();

        f.manager.update_status(order.id, OrderStatus::Completed).await.unwrap();
        let reopened = f.manager.update_status(order.id, OrderStatus::Pending).await.unwrap();

        assert_eq!(reopened.status, OrderStatus::Pending);
        assert_eq!(
            f.metrics.counter_value("orders.status_updated", &[("from", "COMPLETED"), ("to", "PENDING")]),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_write_does_not_evict() {
        let f = fixture();
        let order = f.manager.create(draft()).await.unwrap();
        f.manager.get_by_id(order.id).await.unwrap();
        let evictions = f.cache.eviction_count();

        f.store.set_reject_writes(true);
        let err = f.manager.cancel(order.id).await.unwrap_err();

        assert!(matches!(err, OrderError::InfrastructureUnavailable(_)));
        assert_eq!(f.cache.eviction_count(), evictions);
        assert!(f.cache.peek(&CacheAside::key(order.id)).await.is_some());
        assert_eq!(f.metrics.counter_value("orders.cancelled", &[("from", "PENDING")]), 0);
    }

    #[tokio::test]
    async fn test_status_summary_counts_every_status() {
        let f = fixture();
        for _ in 0..3 {
            f.manager.create(draft()).await.unwrap();
        }
        f.manager.cancel(1).await.unwrap();

        let summary = f.manager.status_summary().await.unwrap();
        assert_eq!(summary.len(), OrderStatus::ALL.len());
        assert_eq!(summary[0], (OrderStatus::Pending, 2));
        assert_eq!(summary[5], (OrderStatus::Cancelled, 1));
    }

    struct BrokenSink;

    impl MetricsSink for BrokenSink {
        fn increment(&self, _name: &str, _tags: &[(&str, &str)]) -> Result<(), MetricsError> {
            Err(MetricsError::Poisoned)
        }
    }

    #[tokio::test]
    async fn test_metrics_failure_does_not_fail_operations() {
        let store = Arc::new(MemoryOrderStore::new());
        let manager = OrderLifecycleManager::new(
            store,
            Arc::new(MemoryCache::new()),
            Arc::new(BrokenSink),
            DEFAULT_TTL,
        );

        let order = manager.create(draft()).await.unwrap();
        let cancelled = manager.cancel(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }
}
