//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for the balance tool:
//! - Per-source request and failure counts
//! - Per-source latency histograms
//! - OAuth login outcomes

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Queries received per source
    pub source_requests_total: CounterVec,
    /// Failed queries per source
    pub source_requests_failure: CounterVec,
    /// Query duration per source
    pub source_request_duration_seconds: HistogramVec,
    /// OAuth callbacks by outcome (success, failure, existing_session)
    pub oauth_logins_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let source_requests_total = CounterVec::new(
            Opts::new(
                "msbt_source_requests_total",
                "Total number of source queries",
            ),
            &["source"],
        )?;

        let source_requests_failure = CounterVec::new(
            Opts::new(
                "msbt_source_requests_failure_total",
                "Total number of failed source queries",
            ),
            &["source", "error_type"],
        )?;

        let source_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "msbt_source_request_duration_seconds",
                "Source query duration in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["source"],
        )?;

        let oauth_logins_total = CounterVec::new(
            Opts::new("msbt_oauth_logins_total", "Total number of OAuth callbacks"),
            &["outcome"],
        )?;

        registry.register(Box::new(source_requests_total.clone()))?;
        registry.register(Box::new(source_requests_failure.clone()))?;
        registry.register(Box::new(source_request_duration_seconds.clone()))?;
        registry.register(Box::new(oauth_logins_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            source_requests_total,
            source_requests_failure,
            source_request_duration_seconds,
            oauth_logins_total,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a successful source query
    pub fn record_source_success(&self, source: &str, duration_secs: f64) {
        self.source_requests_total
            .with_label_values(&[source])
            .inc();
        self.source_request_duration_seconds
            .with_label_values(&[source])
            .observe(duration_secs);
    }

    /// Record a failed source query
    pub fn record_source_failure(&self, source: &str, error_type: &str, duration_secs: f64) {
        self.source_requests_total
            .with_label_values(&[source])
            .inc();
        self.source_requests_failure
            .with_label_values(&[source, error_type])
            .inc();
        self.source_request_duration_seconds
            .with_label_values(&[source])
            .observe(duration_secs);
    }

    /// Record an OAuth callback outcome
    pub fn record_oauth_login(&self, outcome: &str) {
        self.oauth_logins_total.with_label_values(&[outcome]).inc();
    }
}
