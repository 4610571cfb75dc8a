use crate::models::{ContentKind, GenerateParams};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Default, Deserialize)]
pub struct QuoteQuery {
    /// JSON array of previously returned quote blocks.
    pub history: Option<String>,
}

/// `GET /api/quote?history=[...]`
///
/// An unparseable query string is treated like an absent one.
pub async fn get_quote(
    State(state): State<AppState>,
    query: Option<Query<QuoteQuery>>,
) -> impl IntoResponse {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let params = GenerateParams::from_query_history(ContentKind::Quote, query.history.as_deref());
    quote(&state, params).await
}

/// `POST /api/quote`
pub async fn post_quote(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let params = GenerateParams::decode(ContentKind::Quote, &body);
    quote(&state, params).await
}

async fn quote(state: &AppState, params: GenerateParams) -> impl IntoResponse {
    let generation = state.generator.generate(ContentKind::Quote, &params).await;
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], generation.text)
}
