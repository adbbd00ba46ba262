use std::str::FromStr;
use std::time::Duration;

use crate::cache::RedisCacheSettings;
use crate::store::PoolSettings;
use crate::utils::CircuitBreakerConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Every setting comes from an environment variable with a default. A value
// that is present but does not parse is an error naming the variable; it is
// never silently replaced by the default.
//
// ============================================================================

pub const DEFAULT_LOG_FILTER: &str = "info,fresh_chicken_orders=debug";

#[derive(Debug, thiserror::Error)]
#[error("{name} has an invalid value {value:?}: expected {expected}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub expected: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub pool: PoolSettings,
    pub cache_ttl: Duration,
    pub cache_op_timeout: Duration,
    pub cache_breaker: CircuitBreakerConfig,
    pub log_filter: String,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let pool = PoolSettings {
            max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 20, "a connection count")?,
            min_connections: parse(&lookup, "DB_MIN_CONNECTIONS", 5, "a connection count")?,
            acquire_timeout: secs(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 30)?,
            idle_timeout: secs(&lookup, "DB_IDLE_TIMEOUT_SECS", 600)?,
            max_lifetime: secs(&lookup, "DB_MAX_LIFETIME_SECS", 1800)?,
        };

        let cache_breaker = CircuitBreakerConfig {
            failure_threshold: parse(&lookup, "CACHE_BREAKER_FAILURES", 5, "a failure count")?,
            timeout: secs(&lookup, "CACHE_BREAKER_RESET_SECS", 30)?,
            success_threshold: parse(&lookup, "CACHE_BREAKER_SUCCESSES", 2, "a success count")?,
        };

        Ok(Self {
            database_url: text("DATABASE_URL", "postgres://localhost:5432/fresh_chicken"),
            redis_url: text("REDIS_URL", "redis://127.0.0.1:6379"),
            host: text("HTTP_HOST", "0.0.0.0"),
            port: parse(&lookup, "HTTP_PORT", 8080, "a port number")?,
            pool,
            cache_ttl: secs(&lookup, "CACHE_TTL_SECS", 300)?,
            cache_op_timeout: Duration::from_millis(parse(
                &lookup,
                "CACHE_OP_TIMEOUT_MS",
                250,
                "a number of milliseconds",
            )?),
            cache_breaker,
            log_filter: text("RUST_LOG", DEFAULT_LOG_FILTER),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn redis_settings(&self) -> RedisCacheSettings {
        RedisCacheSettings {
            op_timeout: self.cache_op_timeout,
            breaker: self.cache_breaker.clone(),
        }
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError { name, value, expected }),
    }
}

fn secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse(lookup, name, default, "a number of seconds").map(Duration::from_secs)
}
