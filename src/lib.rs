// ============================================================================
// Fresh Chicken Orders - Order Lifecycle Service
// ============================================================================
//
// - domain:  order rules and the lifecycle manager
// - store:   authoritative persistence (PostgreSQL, in-memory)
// - cache:   lookaside cache with TTL (Redis, in-memory) and cache-aside policy
// - metrics: counter sink backed by Prometheus
// - health:  dependency checks
// - api:     actix-web HTTP boundary
//
// ============================================================================

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod health;
pub mod metrics;
pub mod store;
pub mod utils;
