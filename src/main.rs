use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fresh_chicken_orders::api::{self, AppState};
use fresh_chicken_orders::cache::{OrderCache, RedisCache};
use fresh_chicken_orders::config::AppConfig;
use fresh_chicken_orders::domain::order::OrderLifecycleManager;
use fresh_chicken_orders::health::HealthChecker;
use fresh_chicken_orders::metrics::Metrics;
use fresh_chicken_orders::store::{OrderStore, PgOrderStore};
use fresh_chicken_orders::utils::{retry_with_backoff, RetryConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG overrides the configured default filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .init();

    tracing::info!("🚀 Starting Fresh Chicken order service");

    // === 1. Connect to PostgreSQL (retried while the database boots) ===
    tracing::info!("Connecting to PostgreSQL...");
    let store = retry_with_backoff("postgres_connect", &RetryConfig::startup(), |_attempt| {
        PgOrderStore::connect(&config.database_url, &config.pool)
    })
    .await?;

    store.ensure_schema().await?;
    let store: Arc<dyn OrderStore> = Arc::new(store);

    // === 2. Redis cache (lazy; the service runs store-only while it is down) ===
    let cache = RedisCache::new(&config.redis_url, config.redis_settings())?;
    match cache.ping().await {
        Ok(()) => tracing::info!("✅ Redis cache reachable"),
        Err(e) => tracing::warn!(error = %e, "⚠️ Redis unreachable, starting in store-only mode"),
    }
    let cache: Arc<dyn OrderCache> = Arc::new(cache);

    // === 3. Metrics and lifecycle manager ===
    let metrics = Arc::new(Metrics::new()?);
    let manager = OrderLifecycleManager::new(store.clone(), cache.clone(), metrics.clone(), config.cache_ttl);

    let state = AppState {
        manager: Arc::new(manager),
        health: HealthChecker::new(store, cache),
        metrics,
    };

    // === 4. Serve HTTP ===
    api::run(state, &config.address()).await?;

    tracing::info!("👋 Shutting down");
    Ok(())
}
