// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    NETWORK_FETCHES,
    CACHE_OPERATIONS,
    CACHE_ENTRIES,
    SYNC_REGISTRATIONS,
    CLIENT_MESSAGES,
    LIFECYCLE_TRANSITIONS,
};

/// Helper to record an intercepted request
pub fn record_request(route: &str, source: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[route, source, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[route, source])
        .observe(duration_secs);
}

pub fn record_network_fetch(outcome: &str) {
    NETWORK_FETCHES.with_label_values(&[outcome]).inc();
}

/// Helper to record cache operations
pub fn record_cache_hit(generation: &str) {
    CACHE_OPERATIONS.with_label_values(&[generation, "hit"]).inc();
}

pub fn record_cache_miss(generation: &str) {
    CACHE_OPERATIONS.with_label_values(&[generation, "miss"]).inc();
}

pub fn record_cache_write(generation: &str, success: bool) {
    let op = if success { "write" } else { "write_failure" };
    CACHE_OPERATIONS.with_label_values(&[generation, op]).inc();
}

pub fn record_generation_evicted() {
    CACHE_OPERATIONS.with_label_values(&["superseded", "evict"]).inc();
}

pub fn update_cache_entries(generation: &str, count: usize) {
    CACHE_ENTRIES.with_label_values(&[generation]).set(count as f64);
}

pub fn record_sync_registration(tag: &str, outcome: &str) {
    SYNC_REGISTRATIONS.with_label_values(&[tag, outcome]).inc();
}

pub fn record_client_message(message_type: &str, delivered: bool) {
    let delivery = if delivered { "delivered" } else { "dropped" };
    CLIENT_MESSAGES.with_label_values(&[message_type, delivery]).inc();
}

pub fn record_lifecycle(state: &str) {
    LIFECYCLE_TRANSITIONS.with_label_values(&[state]).inc();
}
