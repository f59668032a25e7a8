//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; pipeline counters are defined in
//! `contentforge_core::metrics` and registered into the same registry.
//! Pool gauges and the stored article count are collected when `/metrics`
//! is scraped.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use contentforge_core::ArticleQuery;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "contentforge_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("contentforge_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentforge_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Pool Metrics (collected dynamically)
// =============================================================================

pub static POOL_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentforge_pool_active",
        "Topics currently being processed",
    )
    .unwrap()
});

pub static POOL_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentforge_pool_queued",
        "Topics waiting for a worker slot",
    )
    .unwrap()
});

pub static POOL_PEAK_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentforge_pool_peak_active",
        "Highest number of topics processed at once since startup",
    )
    .unwrap()
});

/// Articles in the store.
pub static ARTICLES_STORED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("contentforge_articles_stored", "Articles in the database").unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Pool
    registry.register(Box::new(POOL_ACTIVE.clone())).unwrap();
    registry.register(Box::new(POOL_QUEUED.clone())).unwrap();
    registry
        .register(Box::new(POOL_PEAK_ACTIVE.clone()))
        .unwrap();

    // Store
    registry
        .register(Box::new(ARTICLES_STORED.clone()))
        .unwrap();

    // Core metrics (topics, generation, publishing, external services)
    for metric in contentforge_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Refresh gauges from the pipeline and the store before a scrape.
pub fn collect_dynamic_metrics(state: &AppState) {
    let status = state.pipeline().status();
    POOL_ACTIVE.set(status.active as i64);
    POOL_QUEUED.set(status.queued as i64);
    POOL_PEAK_ACTIVE.set(status.peak_active as i64);

    if let Ok(count) = state.store().count(&ArticleQuery::default()) {
        ARTICLES_STORED.set(count as i64);
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_article_id() {
        assert_eq!(normalize_path("/api/v1/articles/42"), "/api/v1/articles/{id}");
    }

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/batches/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/batches/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(
            normalize_path("/api/v1/articles/generate"),
            "/api/v1/articles/generate"
        );
    }

    #[test]
    fn test_registry_contains_http_pool_and_core_metrics() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        POOL_ACTIVE.set(0);
        ARTICLES_STORED.set(0);
        contentforge_core::metrics::BATCHES_TOTAL.inc();

        let output = encode_metrics();
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
        assert!(output.contains("contentforge_http_request_duration_seconds"));
        assert!(output.contains("contentforge_http_requests_total"));
        assert!(output.contains("contentforge_http_requests_in_flight"));
        assert!(output.contains("contentforge_pool_active"));
        assert!(output.contains("contentforge_articles_stored"));
        assert!(output.contains("contentforge_batches_total"));
    }
}
