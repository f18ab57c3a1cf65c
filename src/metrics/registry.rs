// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, HistogramVec, GaugeVec, Opts, Registry, TextEncoder, Encoder,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_gauge_vec_with_registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // INTERCEPTION METRICS
    // ============================================================================

    /// Intercepted requests by route and by where the response came from
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("intercepted_requests_total", "Total number of intercepted requests"),
        &["route", "source", "status_code"], // source: cache, network, offline_fallback, error
        REGISTRY
    ).unwrap();

    /// Time until the caller received its response
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("intercepted_request_duration_seconds", "Time to respond to an intercepted request")
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["route", "source"],
        REGISTRY
    ).unwrap();

    /// Upstream fetches by outcome
    pub static ref NETWORK_FETCHES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("network_fetches_total", "Total upstream fetches"),
        &["outcome"], // outcome: ok, http_error, failed
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Cache operations per generation kind
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total cache operations"),
        &["generation", "operation"], // operation: hit, miss, write, write_failure, evict
        REGISTRY
    ).unwrap();

    /// Entries in the current generations
    pub static ref CACHE_ENTRIES: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("cache_entries_current", "Current number of cache entries"),
        &["generation"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // BACKGROUND METRICS
    // ============================================================================

    /// Deferred sync registrations
    pub static ref SYNC_REGISTRATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("sync_registrations_total", "Total deferred sync registrations"),
        &["tag", "outcome"], // outcome: registered, collapsed, failed
        REGISTRY
    ).unwrap();

    /// Messages posted to clients
    pub static ref CLIENT_MESSAGES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("client_messages_total", "Total messages posted to clients"),
        &["type", "delivery"], // delivery: delivered, dropped
        REGISTRY
    ).unwrap();

    /// Worker lifecycle transitions
    pub static ref LIFECYCLE_TRANSITIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("lifecycle_transitions_total", "Total worker lifecycle transitions"),
        &["state"],
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        REQUESTS_TOTAL.with_label_values(&["static", "cache", "200"]).inc();
        CACHE_OPERATIONS.with_label_values(&["api", "hit"]).inc();
        SYNC_REGISTRATIONS.with_label_values(&["sync-fires", "registered"]).inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("intercepted_requests_total"));
        assert!(metrics.contains("cache_operations_total"));
        assert!(metrics.contains("sync_registrations_total"));
    }
}
