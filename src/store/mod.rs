// ============================================================================
// Order Store - Durable, Authoritative Persistence
// ============================================================================
//
// The store is the source of truth for orders. Every write is a single
// statement, so each create / cancel / status update commits atomically.
//
// Implementations:
// - PgOrderStore:     PostgreSQL via sqlx
// - MemoryOrderStore: in-process map used by tests and local runs
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::MemoryOrderStore;
pub use postgres::{PgOrderStore, PoolSettings};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::order::{NewOrder, Order, OrderStatus, Page, PageRequest};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt order record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Result of a guarded status write.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The write committed; carries the stored record.
    Updated(Order),
    /// The stored status no longer matched the expected one; carries the current record.
    Conflict(Order),
    /// No record with that id exists.
    Missing,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order and return it with its assigned id.
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>, StoreError>;

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Order>, StoreError>;

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;

    async fn find_by_customer_containing(
        &self,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<Order>, StoreError>;

    /// Orders created within `[start, end]`, oldest first.
    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError>;

    async fn count_by_status(&self, status: OrderStatus) -> Result<i64, StoreError>;

    /// The `limit` most recently created orders, newest first (ties broken by id).
    async fn find_most_recent(&self, limit: u32) -> Result<Vec<Order>, StoreError>;

    /// Set `status` and `updated_at` only if the stored status still equals `expected`.
    async fn update_status(
        &self,
        id: i64,
        expected: OrderStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
