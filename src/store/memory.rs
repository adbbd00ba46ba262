use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{OrderStore, StoreError, UpdateOutcome};
use crate::domain::order::{NewOrder, Order, OrderStatus, Page, PageRequest, SortDirection, SortField};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Same contract as the PostgreSQL store, including the guarded status write.
// Outages can be simulated to exercise the lifecycle manager's failure paths.
//
// ============================================================================

#[derive(Default)]
struct StoreState {
    next_id: i64,
    orders: BTreeMap<i64, Order>,
}

#[derive(Default)]
pub struct MemoryOrderStore {
    state: RwLock<StoreState>,
    unavailable: AtomicBool,
    reject_writes: AtomicBool,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make writes fail while reads keep working.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.check_available()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store rejects writes".to_string()));
        }
        Ok(())
    }
}

fn compare(a: &Order, b: &Order, field: SortField) -> CmpOrdering {
    let primary = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::TotalPrice => a.total_price.cmp(&b.total_price),
        SortField::Id => CmpOrdering::Equal,
    };
    primary.then(a.id.cmp(&b.id))
}

fn paginate(mut orders: Vec<Order>, page: &PageRequest) -> Page<Order> {
    orders.sort_by(|a, b| {
        let ordering = compare(a, b, page.sort.field);
        match page.sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    let total = orders.len() as u64;
    let content = orders
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .collect();

    Page::new(content, page, total)
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        state.next_id += 1;
        let order = order.into_order(state.next_id);
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>, StoreError> {
        self.check_available()?;
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Order>, StoreError> {
        self.check_available()?;
        let orders = self.state.read().await.orders.values().cloned().collect();
        Ok(paginate(orders, page))
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        self.check_available()?;
        let mut orders: Vec<Order> = self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by(|a, b| compare(b, a, SortField::CreatedAt));
        Ok(orders)
    }

    async fn find_by_customer_containing(
        &self,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        self.check_available()?;
        let orders = self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.customer_name.contains(text))
            .cloned()
            .collect();
        Ok(paginate(orders, page))
    }

    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        self.check_available()?;
        let mut orders: Vec<Order> = self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.created_at >= start && o.created_at <= end)
            .cloned()
            .collect();
        orders.sort_by(|a, b| compare(a, b, SortField::CreatedAt));
        Ok(orders)
    }

    async fn count_by_status(&self, status: OrderStatus) -> Result<i64, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.orders.values().filter(|o| o.status == status).count() as i64)
    }

    async fn find_most_recent(&self, limit: u32) -> Result<Vec<Order>, StoreError> {
        self.check_available()?;
        let mut orders: Vec<Order> = self.state.read().await.orders.values().cloned().collect();
        orders.sort_by(|a, b| compare(b, a, SortField::CreatedAt));
        orders.truncate(limit as usize);
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: i64,
        expected: OrderStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(UpdateOutcome::Missing);
        };

        if order.status != expected {
            return Ok(UpdateOutcome::Conflict(order.clone()));
        }

        order.status = status;
        order.updated_at = updated_at;
        Ok(UpdateOutcome::Updated(order.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderDraft, Sort};
    use chrono::Duration;

    fn new_order(name: &str, price: i32, created_at: DateTime<Utc>) -> NewOrder {
        NewOrder::from_draft(OrderDraft::new(name, "Fried Chicken", 1, price), created_at)
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryOrderStore::new();
        let now = Utc::now();

        let first = store.insert(new_order("Kim", 100, now)).await.unwrap();
        let second = store.insert(new_order("Lee", 200, now)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_guarded_update() {
        let store = MemoryOrderStore::new();
        let now = Utc::now();
        let order = store.insert(new_order("Kim", 100, now)).await.unwrap();
        let later = now + Duration::seconds(5);

        let outcome = store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Confirmed, later)
            .await
            .unwrap();
        let UpdateOutcome::Updated(updated) = outcome else {
            panic!("expected update, got {:?}", outcome);
        };
        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.created_at, now);

        // Stale expectation is rejected and reports the current record
        let outcome = store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled, later)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Conflict(updated));

        let outcome = store
            .update_status(42, OrderStatus::Pending, OrderStatus::Cancelled, later)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Missing);
    }

    #[tokio::test]
    async fn test_most_recent_breaks_ties_by_id() {
        let store = MemoryOrderStore::new();
        let now = Utc::now();
        for i in 0..3 {
            store.insert(new_order(&format!("c{}", i), 100, now)).await.unwrap();
        }

        let recent = store.find_most_recent(2).await.unwrap();
        let ids: Vec<i64> = recent.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_customer_search_pages_results() {
        let store = MemoryOrderStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store
                .insert(new_order("Kim Minsu", 100 * (i + 1), now + Duration::seconds(i as i64)))
                .await
                .unwrap();
        }
        store.insert(new_order("Park", 100, now)).await.unwrap();

        let page = PageRequest::new(1, 2).with_sort(Sort {
            field: SortField::TotalPrice,
            direction: SortDirection::Asc,
        });
        let result = store.find_by_customer_containing("Kim", &page).await.unwrap();

        assert_eq!(result.total_elements, 5);
        assert_eq!(result.total_pages, 3);
        let prices: Vec<i32> = result.content.iter().map(|o| o.total_price).collect();
        assert_eq!(prices, vec![300, 400]);
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        let store = MemoryOrderStore::new();
        let base = Utc::now();
        for i in 0..4 {
            store
                .insert(new_order("Kim", 100, base + Duration::minutes(i)))
                .await
                .unwrap();
        }

        let orders = store
            .find_by_date_range(base + Duration::minutes(1), base + Duration::minutes(2))
            .await
            .unwrap();
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryOrderStore::new();
        store.set_unavailable(true);

        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(store.find_by_id(1).await.is_err());
        assert!(store.insert(new_order("Kim", 100, Utc::now())).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_writes_keep_reads_working() {
        let store = MemoryOrderStore::new();
        let order = store.insert(new_order("Kim", 100, Utc::now())).await.unwrap();
        store.set_reject_writes(true);

        assert!(store.find_by_id(order.id).await.unwrap().is_some());
        assert!(store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Ready, Utc::now())
            .await
            .is_err());
    }
}
