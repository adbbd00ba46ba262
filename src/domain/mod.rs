// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Order rules and the lifecycle manager. Infrastructure (store, cache,
// metrics) is injected through traits and never referenced concretely here.
//
// ============================================================================

pub mod order;
