//! Prometheus metrics for greeting-service.
//!
//! Recording helpers are no-ops until [`init_metrics`] has run, so library
//! code and tests can call them unconditionally.

use axum::{extract::Request, middleware::Next, response::Response};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Instant;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static SERVICE_INFO: OnceLock<IntGaugeVec> = OnceLock::new();

pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

pub static GENERATION_ATTEMPTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENERATION_RESPONSES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once; only the first call
/// registers anything.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    // Always has a sample, so the exposition is never empty.
    let service_info = IntGaugeVec::new(
        Opts::new("service_info", "Greeting service build information"),
        &["version"],
    )
    .expect("Failed to create service_info metric");
    service_info
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1);

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    // outcome: accepted, rejected, or a provider error label
    let attempts = IntCounterVec::new(
        Opts::new(
            "generation_attempts_total",
            "Model calls made while generating text",
        ),
        &["kind", "model", "outcome"],
    )
    .expect("Failed to create generation_attempts_total metric");

    let responses = IntCounterVec::new(
        Opts::new(
            "generation_responses_total",
            "Generated responses by source (model or fallback)",
        ),
        &["kind", "source", "reason"],
    )
    .expect("Failed to create generation_responses_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "provider_latency_seconds",
            "Text provider call latency in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["provider", "model"],
    )
    .expect("Failed to create provider_latency_seconds metric");

    registry
        .register(Box::new(service_info.clone()))
        .expect("Failed to register service_info");
    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(attempts.clone()))
        .expect("Failed to register generation_attempts_total");
    registry
        .register(Box::new(responses.clone()))
        .expect("Failed to register generation_responses_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register provider_latency_seconds");

    let _ = REGISTRY.set(registry);
    let _ = SERVICE_INFO.set(service_info);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = GENERATION_ATTEMPTS_TOTAL.set(attempts);
    let _ = GENERATION_RESPONSES_TOTAL.set(responses);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Count and time every HTTP request. Labels use the matched route pattern
/// when available to keep cardinality bounded.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[&method, &path, &status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[&method, &path])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}

/// Record one model call.
pub fn record_attempt(kind: &str, model: &str, outcome: &str) {
    if let Some(counter) = GENERATION_ATTEMPTS_TOTAL.get() {
        counter.with_label_values(&[kind, model, outcome]).inc();
    }
}

/// Record the source of a served response.
pub fn record_response(kind: &str, source: &str, reason: &str) {
    if let Some(counter) = GENERATION_RESPONSES_TOTAL.get() {
        counter.with_label_values(&[kind, source, reason]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}
