//! Mock provider implementation for testing.

use super::{GenerationParams, ModelInfo, ProviderError, TextProvider};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A call observed by [`MockTextProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub model: String,
    pub prompt: String,
    pub params: GenerationParams,
}

/// Scripted text provider.
///
/// Each model has a queue of outcomes consumed one per call; once a queue is
/// empty the default outcome is returned.
pub struct MockTextProvider {
    configured: bool,
    scripted: Mutex<HashMap<String, VecDeque<Result<String, ProviderError>>>>,
    default_outcome: Result<String, ProviderError>,
    models: Vec<ModelInfo>,
    list_error: Option<ProviderError>,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTextProvider {
    /// A configured provider that fails every call as unavailable.
    pub fn new() -> Self {
        Self {
            configured: true,
            scripted: Mutex::new(HashMap::new()),
            default_outcome: Err(ProviderError::Unavailable("mock: no scripted response".to_string())),
            models: Vec::new(),
            list_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider without credentials.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Queue an outcome for `model`.
    pub fn with_outcome(self, model: &str, outcome: Result<&str, ProviderError>) -> Self {
        self.lock_scripted()
            .entry(model.to_string())
            .or_default()
            .push_back(outcome.map(str::to_string));
        self
    }

    /// Outcome for calls with nothing queued.
    pub fn with_default(mut self, outcome: Result<&str, ProviderError>) -> Self {
        self.default_outcome = outcome.map(str::to_string);
        self
    }

    /// Models returned by `list_models`.
    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = models;
        self
    }

    /// Make `list_models` fail.
    pub fn with_list_error(mut self, error: ProviderError) -> Self {
        self.list_error = Some(error);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Models passed to `generate`, in call order.
    pub fn called_models(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }

    fn lock_scripted(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<Result<String, ProviderError>>>> {
        self.scripted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(MockCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
                params: params.clone(),
            });

        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not configured".to_string(),
            ));
        }

        let scripted = self
            .lock_scripted()
            .get_mut(model)
            .and_then(|queue| queue.pop_front());

        scripted.unwrap_or_else(|| self.default_outcome.clone())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not configured".to_string(),
            ));
        }
        match &self.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.models.clone()),
        }
    }
}
