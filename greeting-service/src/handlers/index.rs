use crate::services::metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use std::time::Duration;

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "greeting-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint for K8s readiness probes.
///
/// The service has no backing store; a missing API key degrades output to
/// fallbacks but does not make it unready.
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// `GET /api`
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "production-ready",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": format_uptime(state.started_at.elapsed()),
        "apiKeyConfigured": state.provider.is_configured(),
        "endpoints": {
            "health": "/api/health",
            "greeting": "/api/greeting (POST)",
            "wish": "/api/wish (POST)",
            "quote": "/api/quote (GET, POST)",
            "models": "/api/models (GET)",
            "metrics": "/metrics"
        },
        "usage": {
            "greeting": "POST /api/greeting {\"greetingType\": \"morning\", \"history\": []}",
            "wish": "POST /api/wish {\"wishType\": \"day\", \"history\": []}",
            "quote": "GET /api/quote → <quote>\"text\"\n<author>Name"
        },
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// `GET /metrics`
pub async fn metrics() -> impl IntoResponse {
    metrics::get_metrics()
}

/// Whole hours and minutes, e.g. `3h 7m`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}
