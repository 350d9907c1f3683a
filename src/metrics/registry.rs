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
    // GOVERNOR METRICS
    // ============================================================================

    /// Assist requests by provider and outcome
    pub static ref GOVERNOR_REQUESTS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("governor_requests_total", "Total assist requests handled by the governor"),
        &["provider", "outcome"], // outcome: hit, miss, fallback, error
        REGISTRY
    ).unwrap();

    /// Upstream call duration
    pub static ref UPSTREAM_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("upstream_duration_seconds", "Upstream provider call duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["provider"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total response cache operations"),
        &["provider", "operation"], // operation: hit, miss, store, evict, expire
        REGISTRY
    ).unwrap();

    // ============================================================================
    // LIMITER METRICS
    // ============================================================================

    /// Limiter transitions
    pub static ref LIMITER_EVENTS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("limiter_events_total", "Rate limiter queue transitions"),
        &["provider", "event"],
        REGISTRY
    ).unwrap();

    /// Items waiting for dispatch
    pub static ref LIMITER_QUEUE_DEPTH: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("limiter_queue_depth", "Requests waiting in the limiter queue"),
        &["provider"],
        REGISTRY
    ).unwrap();

    /// Items currently dispatched upstream
    pub static ref LIMITER_IN_FLIGHT: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("limiter_in_flight", "Requests currently dispatched upstream"),
        &["provider"],
        REGISTRY
    ).unwrap();
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}
