use crate::services::fallback::FallbackSelection;
use crate::services::generator::{GenerationConfig, StructuralErrorPolicy, DEFAULT_MODEL_PRIORITY};
use crate::services::providers::gemini::{GeminiConfig, GEMINI_API_BASE};
use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DEADLINE_SECS: u64 = 30;
const DEFAULT_PROBE_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct GreetingConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub generation: GenerationSettings,
    pub probe: ProbeSettings,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// `GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`.
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Models tried in order for every request.
    pub model_priority: Vec<String>,
    pub deadline_secs: u64,
    pub structural_errors: StructuralErrorPolicy,
    pub fallback_selection: FallbackSelection,
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Most models probed by `GET /api/models`.
    pub limit: usize,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            gemini: GeminiSettings {
                api_key: None,
                base_url: GEMINI_API_BASE.to_string(),
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            generation: GenerationSettings {
                model_priority: DEFAULT_MODEL_PRIORITY.iter().map(|m| m.to_string()).collect(),
                deadline_secs: DEFAULT_DEADLINE_SECS,
                structural_errors: StructuralErrorPolicy::default(),
                fallback_selection: FallbackSelection::default(),
            },
            probe: ProbeSettings {
                limit: DEFAULT_PROBE_LIMIT,
            },
            otlp_endpoint: None,
        }
    }
}

impl GreetingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let api_key = optional_env("GEMINI_API_KEY")
            .or_else(|| optional_env("GOOGLE_API_KEY"))
            .map(Secret::new);
        if api_key.is_none() && is_prod {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_API_KEY is required in production but not set"
            )));
        }

        Ok(GreetingConfig {
            common: common_config,
            gemini: GeminiSettings {
                api_key,
                base_url: optional_env("GEMINI_API_BASE")
                    .unwrap_or_else(|| GEMINI_API_BASE.to_string()),
                request_timeout_secs: parse_env(
                    "GREETING_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
            },
            generation: GenerationSettings {
                model_priority: optional_env("GREETING_MODEL_PRIORITY")
                    .map(|list| parse_model_priority(&list))
                    .filter(|models| !models.is_empty())
                    .unwrap_or_else(|| {
                        DEFAULT_MODEL_PRIORITY.iter().map(|m| m.to_string()).collect()
                    }),
                deadline_secs: parse_env("GREETING_DEADLINE_SECS", DEFAULT_DEADLINE_SECS)?,
                structural_errors: parse_env(
                    "GREETING_STRUCTURAL_ERROR_POLICY",
                    StructuralErrorPolicy::default(),
                )?,
                fallback_selection: parse_env(
                    "GREETING_FALLBACK_SELECTION",
                    FallbackSelection::default(),
                )?,
            },
            probe: ProbeSettings {
                limit: parse_env("GREETING_PROBE_LIMIT", DEFAULT_PROBE_LIMIT)?,
            },
            otlp_endpoint: optional_env("OTLP_ENDPOINT"),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini.api_key.clone(),
            base_url: self.gemini.base_url.clone(),
            request_timeout: Duration::from_secs(self.gemini.request_timeout_secs),
        }
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            models: self.generation.model_priority.clone(),
            structural_errors: self.generation.structural_errors,
            fallback_selection: self.generation.fallback_selection,
            deadline: Duration::from_secs(self.generation.deadline_secs),
            ..GenerationConfig::default()
        }
    }
}

/// Comma-separated model list: trimmed, blanks and duplicates dropped, order kept.
pub fn parse_model_priority(list: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for model in list.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        if !models.iter().any(|m| m == model) {
            models.push(model.to_string());
        }
    }
    models
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional_env(key) {
        Some(val) => val.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, val, e))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_priority_is_trimmed_and_deduplicated() {
        assert_eq!(
            parse_model_priority(" gemini-2.5-flash, ,gemini-pro,gemini-2.5-flash "),
            vec!["gemini-2.5-flash", "gemini-pro"]
        );
        assert!(parse_model_priority(" , ").is_empty());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = GreetingConfig::default();
        assert_eq!(config.generation.model_priority[0], "gemini-2.0-flash-exp");
        assert_eq!(config.generation.model_priority.len(), 5);
        assert_eq!(config.gemini.request_timeout_secs, 30);
        assert_eq!(config.generation.deadline_secs, 30);
        assert_eq!(config.probe.limit, 20);
        assert!(!config.has_api_key());
    }

    #[test]
    fn generation_config_carries_settings() {
        let mut config = GreetingConfig::default();
        config.generation.model_priority = vec!["m1".to_string()];
        config.generation.deadline_secs = 5;
        config.generation.structural_errors = StructuralErrorPolicy::Continue;

        let generation = config.generation_config();
        assert_eq!(generation.models, vec!["m1"]);
        assert_eq!(generation.deadline, Duration::from_secs(5));
        assert_eq!(generation.structural_errors, StructuralErrorPolicy::Continue);
    }

    #[test]
    fn invalid_numeric_env_is_a_config_error() {
        std::env::set_var("GREETING_TEST_PROBE_LIMIT", "many");
        let result = parse_env::<usize>("GREETING_TEST_PROBE_LIMIT", 20);
        assert!(matches!(result, Err(AppError::ConfigError(_))));

        std::env::set_var("GREETING_TEST_PROBE_LIMIT", " 7 ");
        assert_eq!(parse_env::<usize>("GREETING_TEST_PROBE_LIMIT", 20).unwrap(), 7);
        std::env::remove_var("GREETING_TEST_PROBE_LIMIT");
    }
}
