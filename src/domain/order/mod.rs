// ============================================================================
// Order Domain - Business Logic for Orders
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderStatus, paging and sorting)
// - Entity (Order, OrderDraft, NewOrder)
// - Errors (OrderError enum)
// - Lifecycle manager (OrderLifecycleManager)
//
// Persistence and caching live behind the traits in `store` and `cache`.
//
// ============================================================================

pub mod value_objects;
pub mod entity;
pub mod errors;
pub mod lifecycle;

// Re-export for convenience
pub use value_objects::*;
pub use entity::*;
pub use errors::*;
pub use lifecycle::*;
