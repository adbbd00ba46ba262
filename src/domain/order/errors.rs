use super::value_objects::OrderStatus;
use crate::store::StoreError;

// ============================================================================
// Order Lifecycle Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(i64),

    #[error("{}", invalid_state_message(.id, .status))]
    InvalidState { id: i64, status: OrderStatus },

    #[error("Order {0} was modified concurrently, try again")]
    Conflict(i64),

    #[error("Infrastructure unavailable: {0}")]
    InfrastructureUnavailable(#[from] StoreError),
}

fn invalid_state_message(id: &i64, status: &OrderStatus) -> String {
    match *status {
        OrderStatus::Cancelled => format!("Order {} is already cancelled", id),
        OrderStatus::Completed => format!("Order {} is completed and cannot be cancelled", id),
        other => format!("Order {} cannot change status from {}", id, other),
    }
}
