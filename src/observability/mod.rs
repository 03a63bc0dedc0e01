//! # Observability
//!
//! Observability modules for metrics.
//!
//! - `metrics`: Prometheus metrics collection

pub mod metrics;

pub use metrics::*;
