//! Model catalogue probe.
//!
//! Lists the models the configured key can see, sends each a tiny prompt and
//! reports which ones answered. Useful for picking a model priority list.

use crate::services::providers::{ErrorKind, GenerationParams, ModelInfo, ProviderError};
use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use service_core::error::AppError;

const PROBE_PROMPT: &str = "hi";
const PROBE_MAX_TOKENS: i32 = 5;
const PROBE_CONCURRENCY: usize = 4;

/// More working models than this suggests a paid tier.
const PAID_TIER_THRESHOLD: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub status: &'static str,
    pub usage_tier: &'static str,
    pub working_models: Vec<WorkingModel>,
    pub failed_models: Vec<FailedModel>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingModel {
    pub id: String,
    pub display_name: Option<String>,
    pub input_limit: Option<i64>,
    pub output_limit: Option<i64>,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FailedModel {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
struct MissingKey {
    status: &'static str,
    error: String,
}

/// `GET /api/models`
pub async fn probe_models(State(state): State<AppState>) -> Result<Response, AppError> {
    if !state.provider.is_configured() {
        return Ok((
            StatusCode::OK,
            Json(MissingKey {
                status: "no_api_key",
                error: "GEMINI_API_KEY is missing from environment variables".to_string(),
            }),
        )
            .into_response());
    }

    let models = state.provider.list_models().await.map_err(|e| {
        tracing::error!(error = %e, error_kind = e.kind().as_str(), "Failed to list models");
        AppError::BadGateway(e.to_string())
    })?;

    let candidates: Vec<ModelInfo> = models
        .into_iter()
        .filter(ModelInfo::supports_generate_content)
        .take(state.config.probe.limit)
        .collect();

    tracing::info!(candidates = candidates.len(), "Probing models");

    let params = GenerationParams {
        max_tokens: Some(PROBE_MAX_TOKENS),
        ..GenerationParams::default()
    };

    let results: Vec<(ModelInfo, Result<String, ProviderError>)> = stream::iter(candidates)
        .map(|model| {
            let provider = state.provider.clone();
            let params = params.clone();
            async move {
                let result = provider.generate(&model.id, PROBE_PROMPT, &params).await;
                (model, result)
            }
        })
        .buffered(PROBE_CONCURRENCY)
        .collect()
        .await;

    Ok(Json(build_report(results)).into_response())
}

fn build_report(results: Vec<(ModelInfo, Result<String, ProviderError>)>) -> ProbeReport {
    let mut working_models = Vec::new();
    let mut failed_models = Vec::new();

    for (model, result) in results {
        match result {
            // An empty or filtered answer still proves the model is reachable.
            Ok(_) | Err(ProviderError::EmptyResponse) | Err(ProviderError::ContentFiltered) => {
                working_models.push(WorkingModel {
                    id: model.id,
                    display_name: model.display_name,
                    input_limit: model.input_token_limit,
                    output_limit: model.output_token_limit,
                    status: "active",
                })
            }
            Err(e) => {
                let error = match e.kind() {
                    ErrorKind::Quota => "Quota Exceeded".to_string(),
                    _ => e.to_string(),
                };
                failed_models.push(FailedModel {
                    id: model.id,
                    error,
                });
            }
        }
    }

    ProbeReport {
        status: "success",
        usage_tier: usage_tier(working_models.len()),
        working_models,
        failed_models,
    }
}

fn usage_tier(working: usize) -> &'static str {
    if working > PAID_TIER_THRESHOLD {
        "Paid/Higher"
    } else {
        "Free/Limited"
    }
}
