//! Prometheus metrics for sentiment-service.
//!
//! HTTP request metrics come through the `metrics` facade recorder (fed by
//! `service_core::middleware::metrics_middleware`); analysis and provider
//! metrics live in a dedicated `prometheus` registry. `/metrics` renders both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Failed to initialize metrics: {0}")]
pub struct MetricsError(String);

/// Every metric the service exports, built and registered together.
struct Metrics {
    handle: PrometheusHandle,
    registry: Registry,
    analyze_requests_total: IntCounterVec,
    analyze_request_duration_seconds: HistogramVec,
    segments_scored_total: IntCounterVec,
    provider_latency_seconds: HistogramVec,
    provider_errors_total: IntCounterVec,
}

// Set exactly once; concurrent first callers block until it is filled.
static METRICS: OnceLock<Result<Metrics, MetricsError>> = OnceLock::new();

/// Initialize all metrics. Later calls return the first call's outcome.
pub fn init_metrics() -> Result<(), MetricsError> {
    match METRICS.get_or_init(build_metrics) {
        Ok(_) => Ok(()),
        Err(e) => Err(e.clone()),
    }
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get().and_then(|m| m.as_ref().ok())
}

fn build_metrics() -> Result<Metrics, MetricsError> {
    let registry_err = |e: prometheus::Error| MetricsError(e.to_string());

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError(format!("Prometheus recorder: {}", e)))?;

    let registry = Registry::new();

    let analyze_requests_total = IntCounterVec::new(
        Opts::new(
            "sentiment_analyze_requests_total",
            "Total /analyze requests by variant and outcome",
        ),
        &["variant", "outcome"],
    )
    .map_err(registry_err)?;

    let analyze_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "sentiment_analyze_request_duration_seconds",
            "/analyze request duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["variant"],
    )
    .map_err(registry_err)?;

    let segments_scored_total = IntCounterVec::new(
        Opts::new(
            "sentiment_segments_scored_total",
            "Total text segments scored",
        ),
        &["provider"],
    )
    .map_err(registry_err)?;

    let provider_latency_seconds = HistogramVec::new(
        HistogramOpts::new(
            "sentiment_provider_latency_seconds",
            "External provider call latency in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 120.0]),
        &["provider"],
    )
    .map_err(registry_err)?;

    let provider_errors_total = IntCounterVec::new(
        Opts::new(
            "sentiment_provider_errors_total",
            "Total external provider errors",
        ),
        &["provider", "error_type"],
    )
    .map_err(registry_err)?;

    registry
        .register(Box::new(analyze_requests_total.clone()))
        .map_err(registry_err)?;
    registry
        .register(Box::new(analyze_request_duration_seconds.clone()))
        .map_err(registry_err)?;
    registry
        .register(Box::new(segments_scored_total.clone()))
        .map_err(registry_err)?;
    registry
        .register(Box::new(provider_latency_seconds.clone()))
        .map_err(registry_err)?;
    registry
        .register(Box::new(provider_errors_total.clone()))
        .map_err(registry_err)?;

    tracing::info!("Prometheus metrics initialized");

    Ok(Metrics {
        handle,
        registry,
        analyze_requests_total,
        analyze_request_duration_seconds,
        segments_scored_total,
        provider_latency_seconds,
        provider_errors_total,
    })
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let Some(m) = metrics() else {
        tracing::error!("Metrics registry not initialized");
        return "# Metrics registry not initialized\n".to_string();
    };

    let mut output = m.handle.render();

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&m.registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        output.push_str(&format!("# Failed to encode metrics: {}\n", e));
        return output;
    }

    match String::from_utf8(buffer) {
        Ok(custom) => output.push_str(&custom),
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            output.push_str(&format!("# Failed to convert metrics to UTF-8: {}\n", e));
        }
    }

    output
}

// Helper functions for recording metrics

/// Record a completed /analyze request.
pub fn record_analyze_request(variant: &str, outcome: &str, duration_secs: f64) {
    if let Some(m) = metrics() {
        m.analyze_requests_total
            .with_label_values(&[variant, outcome])
            .inc();
        m.analyze_request_duration_seconds
            .with_label_values(&[variant])
            .observe(duration_secs);
    }
}

/// Times one /analyze request from arrival to outcome.
pub struct AnalyzeTimer {
    variant: &'static str,
    start: Instant,
}

impl AnalyzeTimer {
    pub fn start(variant: &'static str) -> Self {
        Self {
            variant,
            start: Instant::now(),
        }
    }

    /// Record the request under `outcome` with its elapsed time.
    pub fn finish(self, outcome: &str) {
        record_analyze_request(self.variant, outcome, self.start.elapsed().as_secs_f64());
    }
}

/// Record segments scored for one document.
pub fn record_segments_scored(provider: &str, count: usize) {
    if let Some(m) = metrics() {
        m.segments_scored_total
            .with_label_values(&[provider])
            .inc_by(count as u64);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, duration_secs: f64) {
    if let Some(m) = metrics() {
        m.provider_latency_seconds
            .with_label_values(&[provider])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(m) = metrics() {
        m.provider_errors_total
            .with_label_values(&[provider, error_type])
            .inc();
    }
}
