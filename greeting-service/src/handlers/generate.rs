//! Greeting and wish endpoints.
//!
//! Both always answer 200 with a [`GeneratedText`] body; every failure on the
//! way is absorbed into a fallback string by the generator.

use crate::models::{ContentKind, GenerateParams, GeneratedText};
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, Json};
use service_core::error::AppError;

/// `POST /api/greeting`
pub async fn greeting(State(state): State<AppState>, body: Bytes) -> Json<GeneratedText> {
    generate(&state, ContentKind::Greeting, &body).await
}

/// `POST /api/wish`
pub async fn wish(State(state): State<AppState>, body: Bytes) -> Json<GeneratedText> {
    generate(&state, ContentKind::Wish, &body).await
}

/// Any other method on a POST-only endpoint.
pub async fn post_required() -> AppError {
    AppError::MethodNotAllowed("POST required".to_string())
}

async fn generate(state: &AppState, kind: ContentKind, body: &[u8]) -> Json<GeneratedText> {
    let params = GenerateParams::decode(kind, body);

    tracing::debug!(
        kind = %kind,
        content_type = %params.content_type,
        history_len = params.history.len(),
        "Generating text"
    );

    let generation = state.generator.generate(kind, &params).await;
    Json(generation.into_response())
}
