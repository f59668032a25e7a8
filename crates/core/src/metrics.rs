//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Batch pipeline (topics, generation, publishing, retries)
//! - External services (generation providers, CMS)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Topics processed total by result.
pub static TOPICS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("contentforge_topics_total", "Total topics processed"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Failed topics by failure kind.
pub static TOPIC_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentforge_topic_failures_total",
            "Total failed topics by failure kind",
        ),
        &["kind"],
    )
    .unwrap()
});

/// Generation duration in seconds.
pub static GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "contentforge_generation_duration_seconds",
            "Duration of article generation calls",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

/// Generation retries total.
pub static GENERATION_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "contentforge_generation_retries_total",
        "Total generation retry attempts",
    )
    .unwrap()
});

/// Publish attempts total by result.
pub static PUBLISH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("contentforge_publish_total", "Total publish attempts"),
        &["result"], // "published", "rejected", "error"
    )
    .unwrap()
});

/// Batch runs total.
pub static BATCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("contentforge_batches_total", "Total batch runs started").unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentforge_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error", "timeout"
    )
    .unwrap()
});

/// LLM tokens used.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("contentforge_llm_tokens_total", "Total LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Pipeline
        Box::new(TOPICS_TOTAL.clone()),
        Box::new(TOPIC_FAILURES.clone()),
        Box::new(GENERATION_DURATION.clone()),
        Box::new(GENERATION_RETRIES.clone()),
        Box::new(PUBLISH_TOTAL.clone()),
        Box::new(BATCHES_TOTAL.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
        Box::new(LLM_TOKENS.clone()),
    ]
}
