//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ytlink server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Authentication failures
//! - Result cache hit/miss counts
//! - Extraction outcomes by operation

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ytlink_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytlink_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ytlink_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytlink_auth_failures_total", "Total authentication failures"),
        &["reason"],
    )
    .unwrap()
});

/// Result cache hits by operation.
pub static CACHE_HITS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytlink_cache_hits_total", "Result cache hits"),
        &["operation"],
    )
    .unwrap()
});

/// Result cache misses by operation.
pub static CACHE_MISSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytlink_cache_misses_total", "Result cache misses"),
        &["operation"],
    )
    .unwrap()
});

/// Terminal extraction outcomes by operation.
pub static EXTRACTION_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ytlink_extraction_outcomes_total",
            "Terminal extraction outcomes",
        ),
        &["operation", "outcome"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(CACHE_HITS_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(CACHE_MISSES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(EXTRACTION_OUTCOMES_TOTAL.clone()))
        .unwrap();
}

/// Collapses request paths to the known route set so label cardinality
/// stays bounded even under URL scanning.
pub fn normalize_path(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/generate-key" => "/generate-key",
        "/info" => "/info",
        "/audio" => "/audio",
        "/video" => "/video",
        _ => "/unknown",
    }
}

/// Renders the registry in Prometheus text exposition format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_known_routes() {
        assert_eq!(normalize_path("/info"), "/info");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_normalize_path_unknown_collapsed() {
        assert_eq!(normalize_path("/admin/../../etc/passwd"), "/unknown");
        assert_eq!(normalize_path("/info/extra"), "/unknown");
    }

    #[test]
    fn test_render_contains_registered_metrics() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .inc();
        let text = render();
        assert!(text.contains("ytlink_http_requests_total"));
    }
}
