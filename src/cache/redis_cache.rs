use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{CacheError, OrderCache};
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

// ============================================================================
// Redis Cache Client
// ============================================================================
//
// Every call is bounded by a per-operation timeout and runs through a circuit
// breaker, so a Redis outage costs at most `op_timeout` per request until the
// breaker opens, and nothing after that.
//
// The connection is opened lazily and dropped on I/O errors, so the service
// starts without Redis and reconnects once it comes back.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RedisCacheSettings {
    pub op_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
}

impl Default for RedisCacheSettings {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_millis(250),
            breaker: CircuitBreakerConfig {
                failure_threshold: 5,
                timeout: Duration::from_secs(30),
                success_threshold: 2,
            },
        }
    }
}

pub struct RedisCache {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    circuit_breaker: CircuitBreaker,
    op_timeout: Duration,
}

impl RedisCache {
    pub fn new(url: &str, settings: RedisCacheSettings) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;

        Ok(Self {
            client,
            connection: Mutex::new(None),
            circuit_breaker: CircuitBreaker::new(settings.breaker),
            op_timeout: settings.op_timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected to Redis");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn run<T, F, Fut>(&self, operation: F) -> Result<T, CacheError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut + Send,
        Fut: Future<Output = Result<T, redis::RedisError>> + Send,
        T: Send,
    {
        let op_timeout = self.op_timeout;

        let result = self
            .circuit_breaker
            .call(async {
                let attempt = async {
                    let conn = self.connection().await?;
                    operation(conn).await
                };

                let outcome = match tokio::time::timeout(op_timeout, attempt).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(CacheError::Redis(e)),
                    Err(_) => Err(CacheError::Timeout(op_timeout)),
                };

                if let Err(e) = &outcome {
                    if e.invalidates_connection() {
                        *self.connection.lock().await = None;
                    }
                }
                outcome
            })
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(CircuitBreakerError::CircuitOpen) => Err(CacheError::CircuitOpen),
            Err(CircuitBreakerError::OperationFailed(e)) => Err(e),
        }
    }
}

#[async_trait]
impl OrderCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.run(|mut conn| async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl.as_secs().max(1);
        self.run(|mut conn| async move { conn.set_ex::<_, _, ()>(key, value, seconds).await })
            .await
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        self.run(|mut conn| async move { conn.del::<_, ()>(key).await })
            .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.run(|mut conn| async move {
            redis::cmd("PING").query_async::<String>(&mut conn).await.map(|_| ())
        })
        .await
    }

    async fn is_degraded(&self) -> bool {
        self.circuit_breaker.state() == CircuitState::Open
    }
}
