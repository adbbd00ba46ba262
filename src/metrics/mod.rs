use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::Mutex;

// ============================================================================
// Metrics Module - Operational counters
// ============================================================================
//
// The lifecycle manager only sees `MetricsSink`: a named counter plus tag
// key/value pairs. `Metrics` backs it with a Prometheus registry that is
// scraped via GET /metrics.
//
// Counter names are dotted ("orders.created") and exported as
// Prometheus names ("orders_created_total"). A counter's label set is
// fixed by its first increment.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics registry lock poisoned")]
    Poisoned,
}

/// Accepts named counter increments. Implementations must be cheap and
/// must never block on I/O.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &str, tags: &[(&str, &str)]) -> Result<(), MetricsError>;
}

/// Increment a counter, logging instead of failing. Metrics never change
/// the outcome of the operation that emits them.
pub fn emit(sink: &dyn MetricsSink, name: &str, tags: &[(&str, &str)]) {
    if let Err(e) = sink.increment(name, tags) {
        tracing::warn!(counter = name, error = %e, "Failed to record metric");
    }
}

/// Prometheus-backed metrics registry for the whole service
pub struct Metrics {
    registry: Registry,
    counters: Mutex<HashMap<String, IntCounterVec>>,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            registry: Registry::new_custom(Some("fresh_chicken".to_string()), None)?,
            counters: Mutex::new(HashMap::new()),
        })
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Current value of a counter, or 0 if it was never incremented with these tags.
    pub fn counter_value(&self, name: &str, tags: &[(&str, &str)]) -> u64 {
        let Ok(counters) = self.counters.lock() else {
            return 0;
        };
        let labels: HashMap<&str, &str> = tags.iter().copied().collect();
        counters
            .get(name)
            .and_then(|vec| vec.get_metric_with(&labels).ok())
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    fn prometheus_name(name: &str) -> String {
        let sanitized: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_total", sanitized)
    }
}

impl MetricsSink for Metrics {
    fn increment(&self, name: &str, tags: &[(&str, &str)]) -> Result<(), MetricsError> {
        let mut counters = self.counters.lock().map_err(|_| MetricsError::Poisoned)?;

        let vec = match counters.get(name) {
            Some(vec) => vec.clone(),
            None => {
                let label_names: Vec<&str> = tags.iter().map(|(k, _)| *k).collect();
                let vec = IntCounterVec::new(
                    Opts::new(Self::prometheus_name(name), format!("Total {} events", name)),
                    &label_names,
                )?;
                self.registry.register(Box::new(vec.clone()))?;
                counters.insert(name.to_string(), vec.clone());
                vec
            }
        };

        let labels: HashMap<&str, &str> = tags.iter().copied().collect();
        vec.get_metric_with(&labels)?.inc();
        Ok(())
    }
}
