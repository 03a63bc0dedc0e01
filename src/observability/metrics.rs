//! # Metrics
//!
//! Prometheus metrics for monitoring the converter.
//!
//! ## Metrics Exposed
//!
//! - `secret2es_conversions_total` - Total number of successful conversions
//! - `secret2es_conversion_errors_total` - Total number of failed conversions, by error kind
//! - `secret2es_conversion_duration_seconds` - Duration of conversion calls
//! - `secret2es_documents_converted_total` - Total number of documents converted
//! - `secret2es_warnings_total` - Total number of warnings emitted, by warning kind

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static CONVERSIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret2es_conversions_total",
        "Total number of successful conversions",
    )
    .expect("Failed to create CONVERSIONS_TOTAL metric - this should never happen")
});

static CONVERSION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret2es_conversion_errors_total",
            "Total number of failed conversions, by error kind",
        ),
        &["kind"],
    )
    .expect("Failed to create CONVERSION_ERRORS_TOTAL metric - this should never happen")
});

static CONVERSION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "secret2es_conversion_duration_seconds",
            "Duration of conversion calls in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create CONVERSION_DURATION metric - this should never happen")
});

static DOCUMENTS_CONVERTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret2es_documents_converted_total",
        "Total number of Secret documents converted to ExternalSecret documents",
    )
    .expect("Failed to create DOCUMENTS_CONVERTED_TOTAL metric - this should never happen")
});

static WARNINGS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret2es_warnings_total",
            "Total number of warnings emitted, by warning kind",
        ),
        &["kind"],
    )
    .expect("Failed to create WARNINGS_TOTAL metric - this should never happen")
});

/// Register all metrics with the registry. Call once at startup.
///
/// # Errors
///
/// Returns an error when a metric is registered twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(CONVERSIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CONVERSION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CONVERSION_DURATION.clone()))?;
    REGISTRY.register(Box::new(DOCUMENTS_CONVERTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WARNINGS_TOTAL.clone()))?;
    Ok(())
}

pub fn record_conversion(duration: Duration) {
    CONVERSIONS_TOTAL.inc();
    CONVERSION_DURATION.observe(duration.as_secs_f64());
}

pub fn record_conversion_error(kind: &str) {
    CONVERSION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_documents_converted(count: usize) {
    DOCUMENTS_CONVERTED_TOTAL.inc_by(count as u64);
}

pub fn record_warning(kind: &str) {
    WARNINGS_TOTAL.with_label_values(&[kind]).inc();
}
