//! Prometheus metrics for core components.
//!
//! This module provides metrics for extractor runs (metadata lookups and
//! downloads). The server registers them next to its HTTP metrics.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Extractor runs by operation and outcome.
pub static EXTRACTOR_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("waloo_extractor_runs_total", "Total extractor runs"),
        // operation: "metadata", "download"
        // outcome: "succeeded", "failed", "cancelled", or an error kind
        &["operation", "outcome"],
    )
    .unwrap()
});

/// Extractor process wall time in seconds.
pub static EXTRACTOR_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "waloo_extractor_duration_seconds",
            "Wall time of extractor processes",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 900.0]),
        &["operation"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(EXTRACTOR_RUNS.clone()),
        Box::new(EXTRACTOR_DURATION.clone()),
    ]
}
