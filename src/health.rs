use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::cache::OrderCache;
use crate::store::OrderStore;

// ============================================================================
// Health Checks
// ============================================================================
//
// The store is required: without it no operation can succeed. The cache is
// optional for correctness, but an unreachable cache is still reported as
// DOWN so operators notice. An open circuit breaker means the service is
// already running store-only, which is reported as DEGRADED.
//
// ============================================================================

/// Health status of a component
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Up,
    Degraded(String),
    Down(String),
}

impl HealthStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, HealthStatus::Up)
    }

    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Up => "UP",
            HealthStatus::Degraded(_) => "DEGRADED",
            HealthStatus::Down(_) => "DOWN",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            HealthStatus::Up => None,
            HealthStatus::Degraded(reason) | HealthStatus::Down(reason) => Some(reason),
        }
    }
}

/// Health information for a component
#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub components: Vec<ComponentHealth>,
}

impl HealthReport {
    /// Worst status across all components.
    pub fn overall(&self) -> HealthStatus {
        if let Some(down) = self.components.iter().find(|c| c.status.is_down()) {
            return HealthStatus::Down(format!("{} is down", down.name));
        }
        if let Some(degraded) = self.components.iter().find(|c| !c.status.is_up()) {
            return HealthStatus::Degraded(format!("{} is degraded", degraded.name));
        }
        HealthStatus::Up
    }
}

#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self { store, cache }
    }

    pub async fn check(&self) -> HealthReport {
        let (database, cache) = tokio::join!(self.check_store(), self.check_cache());
        HealthReport {
            components: vec![database, cache],
        }
    }

    async fn check_store(&self) -> ComponentHealth {
        let status = match self.store.ping().await {
            Ok(()) => HealthStatus::Up,
            Err(e) => {
                tracing::error!(error = %e, "Database health check failed");
                HealthStatus::Down(e.to_string())
            }
        };
        ComponentHealth::new("database", status)
    }

    async fn check_cache(&self) -> ComponentHealth {
        if self.cache.is_degraded().await {
            return ComponentHealth::new(
                "cache",
                HealthStatus::Degraded("circuit breaker open, serving from database".to_string()),
            );
        }

        let status = match self.cache.ping().await {
            Ok(()) => HealthStatus::Up,
            Err(e) => {
                tracing::warn!(error = %e, "Cache health check failed");
                HealthStatus::Down(e.to_string())
            }
        };
        ComponentHealth::new("cache", status)
    }
}
