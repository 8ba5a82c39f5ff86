use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Result, VoxError};
use crate::llm::api::LlmApiClient;

/// Sampling and length controls passed through to the completion endpoint.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
enum ProviderState {
    Ready(Arc<LlmConfig>),
    Unavailable(String),
}

/// Handle to the configured chat completion endpoint.
///
/// Always constructible. When no endpoint is configured the provider records
/// the reason and every completion fails with `LlmUnavailable`, leaving the
/// degradation decision to the caller.
#[derive(Debug, Clone)]
pub struct LlmProvider {
    state: ProviderState,
}

impl LlmProvider {
    /// Builds a provider from optional configuration. A config without an
    /// API key still counts as configured when it points at a custom base
    /// URL, since local inference servers accept keyless requests.
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let state = match config {
            None => ProviderState::Unavailable("No LLM configuration provided".to_string()),
            Some(config) if config.api_key.is_none() && config.base_url.is_none() => {
                ProviderState::Unavailable("No LLM API key configured".to_string())
            }
            Some(config) => ProviderState::Ready(Arc::new(config.clone())),
        };
        Self { state }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            state: ProviderState::Unavailable(reason.to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ProviderState::Ready(_))
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        match &self.state {
            ProviderState::Ready(config) => Some(config),
            ProviderState::Unavailable(_) => None,
        }
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        let config = match &self.state {
            ProviderState::Ready(config) => config,
            ProviderState::Unavailable(reason) => {
                return Err(VoxError::LlmUnavailable(reason.clone()));
            }
        };

        let client = LlmApiClient::new(config)?;
        client.complete(prompt, system_prompt, options).await
    }
}
