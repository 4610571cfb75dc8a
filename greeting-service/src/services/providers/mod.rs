//! Text generation provider abstraction.
//!
//! The rest of the service only sees [`TextProvider`] and the typed
//! [`ProviderError`]; HTTP statuses and Google RPC error strings are
//! interpreted once, inside the provider implementation.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a provider failure, used to decide whether the
/// next model in the priority list is worth trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable API key. No model can succeed.
    Credential,

    /// Quota exhausted or rate limited for this model.
    Quota,

    /// The request itself was rejected.
    Structural,

    /// The model is down, unknown to this key, filtered the output, or the
    /// network failed.
    Unavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Credential => "credential",
            ErrorKind::Quota => "quota",
            ErrorKind::Structural => "structural",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Empty response")]
    EmptyResponse,
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::NotConfigured(_) | ProviderError::Unauthorized(_) => {
                ErrorKind::Credential
            }
            ProviderError::RateLimited(_) => ErrorKind::Quota,
            ProviderError::InvalidRequest(_) => ErrorKind::Structural,
            ProviderError::ModelNotFound(_)
            | ProviderError::Unavailable(_)
            | ProviderError::NetworkError(_)
            | ProviderError::ContentFiltered
            | ProviderError::EmptyResponse => ErrorKind::Unavailable,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::ModelNotFound(_) => "model_not_found",
            ProviderError::Unauthorized(_) => "unauthorized",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::Unavailable(_) => "unavailable",
            ProviderError::NetworkError(_) => "network",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::EmptyResponse => "empty_response",
        }
    }
}

/// Sampling settings for one generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Top-p sampling.
    pub top_p: Option<f32>,

    /// Top-k sampling.
    pub top_k: Option<i32>,

    /// Maximum output tokens.
    pub max_tokens: Option<i32>,
}

/// A model advertised by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Identifier usable in [`TextProvider::generate`], without `models/`.
    pub id: String,

    pub display_name: Option<String>,

    pub input_token_limit: Option<i64>,

    pub output_token_limit: Option<i64>,

    #[serde(skip)]
    pub supported_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_methods.iter().any(|m| m == "generateContent")
    }
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name for logs and metric labels.
    fn name(&self) -> &'static str;

    /// Whether credentials are present. Unconfigured providers fail every
    /// call with [`ProviderError::NotConfigured`].
    fn is_configured(&self) -> bool;

    /// Generate text from `prompt` with the given model.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;

    /// List the models available to the configured key.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError>;
}
