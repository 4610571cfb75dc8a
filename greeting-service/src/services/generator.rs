//! Model-fallback caller.
//!
//! One request walks the model priority list in order:
//!
//! ```text
//! Prompting -> Calling(model_i) -> Validating -> Accept
//!                    |                 |
//!                    +---- NextModel --+--> Fallback
//! ```
//!
//! Whatever happens, [`Generator::generate`] returns text: either accepted
//! model output or an entry from the kind's [`FallbackTable`].

use crate::models::{ContentKind, GenerateParams, GeneratedText, TextSource, FALLBACK_MODEL};
use crate::services::cleaner::{self, CleanPolicy, Rejection};
use crate::services::fallback::{FallbackSelection, FallbackTable};
use crate::services::metrics;
use crate::services::prompt::PromptBuilder;
use crate::services::providers::{ErrorKind, GenerationParams, ProviderError, TextProvider};
use chrono::Utc;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_MODEL_PRIORITY: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-2.5-flash",
    "gemini-1.5-flash",
    "gemini-pro",
    "gemini-1.0-pro",
];

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// What to do when a model rejects the request as malformed.
///
/// The same prompt and parameters go to every model, so a structural error
/// usually repeats down the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuralErrorPolicy {
    #[default]
    Abort,
    Continue,
}

impl FromStr for StructuralErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(StructuralErrorPolicy::Abort),
            "continue" => Ok(StructuralErrorPolicy::Continue),
            other => Err(format!("unknown structural error policy '{}'", other)),
        }
    }
}

/// Per-kind settings.
#[derive(Debug, Clone)]
pub struct KindProfile {
    pub params: GenerationParams,
    pub policy: CleanPolicy,
    pub fallback: FallbackTable,
}

impl KindProfile {
    pub fn builtin(kind: ContentKind) -> Self {
        let params = match kind {
            ContentKind::Greeting => GenerationParams {
                temperature: Some(1.5),
                top_p: Some(0.95),
                top_k: Some(40),
                max_tokens: Some(25),
            },
            ContentKind::Wish => GenerationParams {
                temperature: Some(1.3),
                top_p: Some(0.95),
                top_k: Some(40),
                max_tokens: Some(35),
            },
            ContentKind::Quote => GenerationParams {
                temperature: Some(1.2),
                top_p: Some(0.95),
                top_k: Some(40),
                max_tokens: Some(150),
            },
        };

        Self {
            params,
            policy: CleanPolicy::for_kind(kind),
            fallback: FallbackTable::builtin(kind),
        }
    }
}

/// Immutable generation settings, built once at startup.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub models: Vec<String>,
    pub structural_errors: StructuralErrorPolicy,
    pub fallback_selection: FallbackSelection,
    pub deadline: Duration,
    pub greeting: KindProfile,
    pub wish: KindProfile,
    pub quote: KindProfile,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODEL_PRIORITY.iter().map(|m| m.to_string()).collect(),
            structural_errors: StructuralErrorPolicy::default(),
            fallback_selection: FallbackSelection::default(),
            deadline: DEFAULT_DEADLINE,
            greeting: KindProfile::builtin(ContentKind::Greeting),
            wish: KindProfile::builtin(ContentKind::Wish),
            quote: KindProfile::builtin(ContentKind::Quote),
        }
    }
}

impl GenerationConfig {
    pub fn profile(&self, kind: ContentKind) -> &KindProfile {
        match kind {
            ContentKind::Greeting => &self.greeting,
            ContentKind::Wish => &self.wish,
            ContentKind::Quote => &self.quote,
        }
    }
}

/// Why the fallback table answered instead of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    MissingCredential,
    Exhausted,
    Aborted(ErrorKind),
    DeadlineElapsed,
}

impl FallbackReason {
    pub fn label(&self) -> &'static str {
        match self {
            FallbackReason::MissingCredential => "missing_credential",
            FallbackReason::Exhausted => "exhausted",
            FallbackReason::Aborted(_) => "aborted",
            FallbackReason::DeadlineElapsed => "deadline_elapsed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Fallback(FallbackReason),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Fallback(reason) => reason.label(),
        }
    }
}

/// Result of one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub kind: ContentKind,
    pub content_type: String,
    pub text: String,
    pub model: String,
    pub outcome: Outcome,
}

impl Generation {
    pub fn source(&self) -> TextSource {
        match self.outcome {
            Outcome::Accepted => TextSource::Model,
            Outcome::Fallback(_) => TextSource::Fallback,
        }
    }

    pub fn into_response(self) -> GeneratedText {
        GeneratedText {
            source: self.source(),
            text: self.text,
            content_type: self.content_type,
            kind: self.kind,
            model: self.model,
            timestamp: Utc::now(),
        }
    }
}

/// What a single failed attempt means for the rest of the loop.
enum Next {
    TryNextModel,
    Abort(ErrorKind),
}

pub struct Generator {
    provider: Arc<dyn TextProvider>,
    config: GenerationConfig,
    prompts: PromptBuilder,
}

impl Generator {
    pub fn new(provider: Arc<dyn TextProvider>, config: GenerationConfig) -> Self {
        Self {
            provider,
            config,
            prompts: PromptBuilder::default(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Produce text for `kind`. Never fails.
    pub async fn generate(&self, kind: ContentKind, params: &GenerateParams) -> Generation {
        let outcome = if !self.provider.is_configured() {
            warn!(
                kind = %kind,
                error_kind = ErrorKind::Credential.as_str(),
                "No API key configured, serving fallback"
            );
            Err(FallbackReason::MissingCredential)
        } else {
            let prompt = self
                .prompts
                .build(kind, &params.content_type, &params.history);

            match tokio::time::timeout(self.config.deadline, self.try_models(kind, &prompt)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        kind = %kind,
                        deadline_secs = self.config.deadline.as_secs_f64(),
                        "Generation deadline elapsed, serving fallback"
                    );
                    Err(FallbackReason::DeadlineElapsed)
                }
            }
        };

        let generation = match outcome {
            Ok((model, text)) => Generation {
                kind,
                content_type: params.content_type.clone(),
                text,
                model,
                outcome: Outcome::Accepted,
            },
            Err(reason) => self.fallback(kind, &params.content_type, reason),
        };

        metrics::record_response(
            kind.as_str(),
            generation.source().as_str(),
            generation.outcome.label(),
        );
        generation
    }

    async fn try_models(
        &self,
        kind: ContentKind,
        prompt: &str,
    ) -> Result<(String, String), FallbackReason> {
        let profile = self.config.profile(kind);

        for model in &self.config.models {
            let started = Instant::now();
            let result = self.provider.generate(model, prompt, &profile.params).await;
            let latency = started.elapsed();
            metrics::record_provider_latency(self.provider.name(), model, latency.as_secs_f64());

            let raw = match result {
                Ok(raw) => raw,
                Err(err) => match self.on_provider_error(kind, model, &err, latency) {
                    Next::TryNextModel => continue,
                    Next::Abort(error_kind) => return Err(FallbackReason::Aborted(error_kind)),
                },
            };

            match accept(kind, &raw, &profile.policy) {
                Ok(text) => {
                    info!(
                        kind = %kind,
                        model = %model,
                        latency_ms = latency.as_millis() as u64,
                        "Model output accepted"
                    );
                    metrics::record_attempt(kind.as_str(), model, "accepted");
                    return Ok((model.clone(), text));
                }
                Err(rejection) => {
                    warn!(
                        kind = %kind,
                        model = %model,
                        latency_ms = latency.as_millis() as u64,
                        rejection = rejection.label(),
                        reason = %rejection,
                        "Model output rejected, trying next model"
                    );
                    metrics::record_attempt(kind.as_str(), model, "rejected");
                }
            }
        }

        warn!(kind = %kind, "All models failed, serving fallback");
        Err(FallbackReason::Exhausted)
    }

    fn on_provider_error(
        &self,
        kind: ContentKind,
        model: &str,
        err: &ProviderError,
        latency: Duration,
    ) -> Next {
        let error_kind = err.kind();
        let next = match error_kind {
            ErrorKind::Quota | ErrorKind::Unavailable => Next::TryNextModel,
            ErrorKind::Structural => match self.config.structural_errors {
                StructuralErrorPolicy::Continue => Next::TryNextModel,
                StructuralErrorPolicy::Abort => Next::Abort(error_kind),
            },
            ErrorKind::Credential => Next::Abort(error_kind),
        };

        warn!(
            kind = %kind,
            model = %model,
            latency_ms = latency.as_millis() as u64,
            error_kind = error_kind.as_str(),
            error = %err,
            abort = matches!(next, Next::Abort(_)),
            "Model call failed"
        );
        metrics::record_attempt(kind.as_str(), model, err.label());

        next
    }

    fn fallback(&self, kind: ContentKind, content_type: &str, reason: FallbackReason) -> Generation {
        let text = self
            .config
            .profile(kind)
            .fallback
            .pick(content_type, self.config.fallback_selection);

        info!(
            kind = %kind,
            content_type = %content_type,
            reason = reason.label(),
            "Serving fallback text"
        );

        Generation {
            kind,
            content_type: content_type.to_string(),
            text,
            model: FALLBACK_MODEL.to_string(),
            outcome: Outcome::Fallback(reason),
        }
    }
}

/// Clean and validate raw model output for `kind`.
fn accept(kind: ContentKind, raw: &str, policy: &CleanPolicy) -> Result<String, Rejection> {
    match kind {
        ContentKind::Quote => cleaner::parse_quote(raw, policy).map(|quote| quote.render()),
        ContentKind::Greeting | ContentKind::Wish => cleaner::clean_and_validate(raw, policy),
    }
}
