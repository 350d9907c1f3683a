// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    GOVERNOR_REQUESTS,
    UPSTREAM_DURATION,
    CACHE_OPERATIONS,
    LIMITER_EVENTS,
    LIMITER_QUEUE_DEPTH,
    LIMITER_IN_FLIGHT,
};

/// Helper to record the outcome of one governed request
pub fn record_request(provider: &str, outcome: &str) {
    GOVERNOR_REQUESTS
        .with_label_values(&[provider, outcome])
        .inc();
}

/// Helper to record upstream call latency
pub fn record_upstream_call(provider: &str, duration_secs: f64) {
    UPSTREAM_DURATION
        .with_label_values(&[provider])
        .observe(duration_secs);
}

/// Helper to record response cache operations
pub fn record_cache_operation(provider: &str, operation: &str) {
    CACHE_OPERATIONS
        .with_label_values(&[provider, operation])
        .inc();
}

/// Helper to record limiter transitions
pub fn record_limiter_event(provider: &str, event: &str) {
    LIMITER_EVENTS.with_label_values(&[provider, event]).inc();
}

pub fn update_limiter_gauges(provider: &str, queue_depth: usize, in_flight: usize) {
    LIMITER_QUEUE_DEPTH
        .with_label_values(&[provider])
        .set(queue_depth as f64);
    LIMITER_IN_FLIGHT
        .with_label_values(&[provider])
        .set(in_flight as f64);
}
