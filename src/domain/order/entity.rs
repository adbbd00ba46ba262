use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::value_objects::OrderStatus;

// ============================================================================
// Order Entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity (assigned by the store)
    pub id: i64,

    pub customer_name: String,
    pub menu_item: String,
    pub quantity: i32,
    pub total_price: i32,
    pub status: OrderStatus,
    pub notes: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation input. Field-level validation happens at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_name: String,
    pub menu_item: String,
    pub quantity: i32,
    pub total_price: i32,
    pub notes: Option<String>,
}

impl OrderDraft {
    pub fn new(customer_name: impl Into<String>, menu_item: impl Into<String>, quantity: i32, total_price: i32) -> Self {
        Self {
            customer_name: customer_name.into(),
            menu_item: menu_item.into(),
            quantity,
            total_price,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A fully-formed record waiting for the store to assign its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_name: String,
    pub menu_item: String,
    pub quantity: i32,
    pub total_price: i32,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewOrder {
    /// Every order enters the lifecycle as `Pending` with matching timestamps.
    pub fn from_draft(draft: OrderDraft, now: DateTime<Utc>) -> Self {
        Self {
            customer_name: draft.customer_name,
            menu_item: draft.menu_item,
            quantity: draft.quantity,
            total_price: draft.total_price,
            status: OrderStatus::Pending,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_order(self, id: i64) -> Order {
        Order {
            id,
            customer_name: self.customer_name,
            menu_item: self.menu_item,
            quantity: self.quantity,
            total_price: self.total_price,
            status: self.status,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_starts_pending() {
        let now = Utc::now();
        let draft = OrderDraft::new("Kim", "Fried Chicken", 2, 24000).with_notes("extra sauce");
        let new_order = NewOrder::from_draft(draft, now);

        assert_eq!(new_order.status, OrderStatus::Pending);
        assert_eq!(new_order.created_at, new_order.updated_at);
        assert_eq!(new_order.notes.as_deref(), Some("extra sauce"));

        let order = new_order.into_order(7);
        assert_eq!(order.id, 7);
        assert_eq!(order.menu_item, "Fried Chicken");
    }

    #[test]
    fn test_order_serialization() {
        let order = NewOrder::from_draft(OrderDraft::new("Lee", "Wings", 1, 9000), Utc::now()).into_order(1);

        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(order, deserialized);
    }
}
