use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::{OrderStore, StoreError, UpdateOutcome};
use crate::domain::order::{NewOrder, Order, OrderStatus, Page, PageRequest, SortDirection};

// ============================================================================
// PostgreSQL Order Store
// ============================================================================
//
// Statuses are stored by name (VARCHAR) so the column stays readable and
// survives enum reordering. All sort columns come from a fixed whitelist
// (SortField::column), never from caller text.
//
// ============================================================================

const COLUMNS: &str =
    "id, customer_name, menu_item, quantity, total_price, status, notes, created_at, updated_at";

/// Connection pool limits for the order database.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(Some(settings.idle_timeout))
            .max_lifetime(Some(settings.max_lifetime))
            .connect(url)
            .await?;

        tracing::info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self { pool })
    }

    /// Create the `orders` table and its indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS orders (
                id BIGSERIAL PRIMARY KEY,
                customer_name VARCHAR(100) NOT NULL,
                menu_item VARCHAR(200) NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity >= 1),
                total_price INTEGER NOT NULL CHECK (total_price >= 0),
                status VARCHAR(20) NOT NULL,
                notes VARCHAR(500),
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at DESC)")
            .execute(&self.pool)
            .await?;

        tracing::info!("Order schema ready");
        Ok(())
    }

    async fn count(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        let total: i64 = match filter {
            Some(pattern) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_name LIKE $1")
                    .bind(pattern)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(total.max(0) as u64)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_name: String,
    menu_item: String,
    quantity: i32,
    total_price: i32,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|e| StoreError::Corrupt {
            id: row.id,
            reason: format!("{}", e),
        })?;

        Ok(Order {
            id: row.id,
            customer_name: row.customer_name,
            menu_item: row.menu_item,
            quantity: row.quantity,
            total_price: row.total_price,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
    rows.into_iter().map(Order::try_from).collect()
}

fn order_clause(page: &PageRequest) -> String {
    let direction = match page.sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!("ORDER BY {} {}, id {}", page.sort.field.column(), direction, direction)
}

/// `%text%` with LIKE wildcards in `text` escaped.
fn contains_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (customer_name, menu_item, quantity, total_price, status, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            COLUMNS
        ))
        .bind(&order.customer_name)
        .bind(&order.menu_item)
        .bind(order.quantity)
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(order_id = row.id, "Inserted order row");
        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Order::try_from).transpose()
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders {} LIMIT $1 OFFSET $2",
            COLUMNS,
            order_clause(page)
        ))
        .bind(page.size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count(None).await?;
        Ok(Page::new(into_orders(rows)?, page, total))
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE status = $1 ORDER BY created_at DESC, id DESC",
            COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    async fn find_by_customer_containing(
        &self,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        let pattern = contains_pattern(text);
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE customer_name LIKE $1 {} LIMIT $2 OFFSET $3",
            COLUMNS,
            order_clause(page)
        ))
        .bind(&pattern)
        .bind(page.size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count(Some(&pattern)).await?;
        Ok(Page::new(into_orders(rows)?, page, total))
    }

    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE created_at BETWEEN $1 AND $2 ORDER BY created_at ASC, id ASC",
            COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    async fn count_by_status(&self, status: OrderStatus) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_most_recent(&self, limit: u32) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1",
            COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    async fn update_status(
        &self,
        id: i64,
        expected: OrderStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = $3, updated_at = $4
             WHERE id = $1 AND status = $2
             RETURNING {}",
            COLUMNS
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(status.as_str())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(UpdateOutcome::Updated(row.try_into()?));
        }

        // Guard did not match: either the row is gone or its status moved on.
        Ok(match self.find_by_id(id).await? {
            Some(current) => UpdateOutcome::Conflict(current),
            None => UpdateOutcome::Missing,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let _: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
