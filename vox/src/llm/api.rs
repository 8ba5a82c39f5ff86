use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
        Stop,
    },
    Client,
};
use reqwest::StatusCode;

use crate::{
    config::LlmConfig,
    error::{Result, VoxError},
    llm::provider::CompletionOptions,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// How a failed chat call is handled. Rate limits and auth rejections
/// surface immediately; only transient failures go back through the retry
/// loop.
enum FailureKind {
    RateLimited,
    AuthRejected,
    Transient,
    Permanent,
}

#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_retries: u32,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        // A custom base URL usually points at a local or proxied server that
        // does its own auth; only the default endpoint demands a key.
        if config.base_url.is_none() && config.api_key.is_none() {
            return Err(VoxError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        let openai_config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| VoxError::Llm(format!("Failed to create LLM HTTP client: {error}")))?;

        // Bound async-openai's internal backoff by our timeout. Its default
        // max_elapsed_time retries server errors for up to 15 minutes,
        // independent of the retry loop in complete().
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(config.timeout_secs)),
            ..Default::default()
        };

        Ok(Self {
            client: Client::with_config(openai_config)
                .with_http_client(http_client)
                .with_backoff(backoff),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(VoxError::Validation("Prompt cannot be empty".to_string()));
        }

        let mut last_error: Option<VoxError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let request = self.build_request(prompt, system_prompt, options)?;

            match self.client.chat().create(request).await {
                Ok(response) => return extract_content(response),
                Err(error) => match classify(&error) {
                    FailureKind::RateLimited => {
                        return Err(VoxError::LlmRateLimit { retry_after: None });
                    }
                    FailureKind::AuthRejected => {
                        return Err(VoxError::Llm(format!(
                            "LLM authentication failed: {error}"
                        )));
                    }
                    FailureKind::Transient if attempt < self.max_retries => {
                        last_error = Some(map_openai_error(error));
                    }
                    _ => return Err(map_openai_error(error)),
                },
            }
        }

        Err(last_error
            .unwrap_or_else(|| VoxError::Llm("LLM completion failed after retries".to_string())))
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::new();

        if let Some(system) = system_prompt.filter(|value| !value.trim().is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|error| {
                        VoxError::Validation(format!("Invalid system prompt: {error}"))
                    })?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|error| VoxError::Validation(format!("Invalid user prompt: {error}")))?
                .into(),
        );

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.model.clone()).messages(messages);

        if let Some(options) = options {
            if let Some(temperature) = options.temperature {
                request.temperature(temperature);
            }
            if let Some(max_tokens) = options.max_tokens {
                request.max_tokens(max_tokens);
            }
            if let Some(top_p) = options.top_p {
                request.top_p(top_p);
            }
            if let Some(stop) = options.stop.as_ref().filter(|values| !values.is_empty()) {
                request.stop(Stop::StringArray(stop.clone()));
            }
        }

        request.build().map_err(|error| {
            VoxError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }
}

fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(VoxError::Llm(
            "LLM response contained no usable content".to_string(),
        ));
    }

    Ok(content)
}

fn classify(error: &OpenAIError) -> FailureKind {
    match error {
        OpenAIError::Reqwest(reqwest_error) => match reqwest_error.status() {
            Some(StatusCode::TOO_MANY_REQUESTS) => FailureKind::RateLimited,
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => {
                FailureKind::AuthRejected
            }
            Some(status) if status.is_server_error() => FailureKind::Transient,
            Some(_) => FailureKind::Permanent,
            None => FailureKind::Transient,
        },
        OpenAIError::ApiError(api_error) => {
            if mentions_rate_limit(api_error) {
                FailureKind::RateLimited
            } else if mentions_auth_failure(api_error) {
                FailureKind::AuthRejected
            } else if api_error.r#type.is_none() && api_error.code.is_none() {
                FailureKind::Transient
            } else {
                FailureKind::Permanent
            }
        }
        _ => FailureKind::Permanent,
    }
}

fn mentions_rate_limit(api_error: &ApiError) -> bool {
    let message = api_error.message.to_lowercase();
    let error_type = lowered(&api_error.r#type);
    let code = lowered(&api_error.code);

    message.contains("rate limit")
        || message.contains("too many requests")
        || error_type.contains("rate_limit")
        || code.contains("rate_limit")
        || code == "insufficient_quota"
}

fn mentions_auth_failure(api_error: &ApiError) -> bool {
    let message = api_error.message.to_lowercase();
    let error_type = lowered(&api_error.r#type);
    let code = lowered(&api_error.code);

    message.contains("unauthorized")
        || message.contains("forbidden")
        || message.contains("authentication")
        || message.contains("invalid api key")
        || code.contains("invalid_api_key")
        || code.contains("authentication")
        || error_type.contains("authentication")
}

fn lowered(value: &Option<String>) -> String {
    value.clone().unwrap_or_default().to_lowercase()
}

fn map_openai_error(error: OpenAIError) -> VoxError {
    match error {
        OpenAIError::Reqwest(reqwest_error) => {
            VoxError::Llm(format!("LLM request failed: {reqwest_error}"))
        }
        OpenAIError::ApiError(api_error) => VoxError::Llm(format!("LLM API error: {api_error}")),
        OpenAIError::JSONDeserialize(err) => {
            VoxError::Llm(format!("Failed to parse LLM response: {err}"))
        }
        OpenAIError::InvalidArgument(message) => VoxError::Validation(message),
        other => VoxError::Llm(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn test_llm_config() -> LlmConfig {
        LlmConfig {
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: Some("http://localhost:1234/v1".to_string()),
            timeout_secs: 30,
            max_retries: 0,
            max_tokens: 400,
        }
    }

    #[test]
    fn test_client_requires_key_for_default_endpoint() {
        let config = LlmConfig {
            base_url: None,
            ..test_llm_config()
        };
        assert!(LlmApiClient::new(&config).is_err());
    }

    #[test]
    fn test_client_allows_keyless_custom_endpoint() {
        let config = test_llm_config();
        assert!(LlmApiClient::new(&config).is_ok());
    }

    #[test]
    fn test_build_request_includes_system_message() {
        let client = LlmApiClient::new(&test_llm_config()).unwrap();
        let request = client
            .build_request("question", Some("system role"), None)
            .unwrap();
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn test_build_request_applies_options() {
        let client = LlmApiClient::new(&test_llm_config()).unwrap();
        let options = CompletionOptions {
            temperature: Some(0.3),
            max_tokens: Some(400),
            ..Default::default()
        };
        let request = client
            .build_request("question", None, Some(&options))
            .unwrap();
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(400));
    }

    #[test]
    fn test_untyped_api_error_is_transient() {
        let error = OpenAIError::ApiError(ApiError {
            message: "bad gateway".to_string(),
            r#type: None,
            param: None,
            code: None,
        });
        assert!(matches!(classify(&error), FailureKind::Transient));
    }

    #[test]
    fn test_quota_api_error_maps_to_rate_limit() {
        let error = OpenAIError::ApiError(ApiError {
            message: "You exceeded your current quota".to_string(),
            r#type: Some("insufficient_quota".to_string()),
            param: None,
            code: Some("insufficient_quota".to_string()),
        });
        assert!(matches!(classify(&error), FailureKind::RateLimited));
    }

    #[test]
    fn test_typed_api_error_is_permanent() {
        let error = OpenAIError::ApiError(ApiError {
            message: "model not found".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: Some("model".to_string()),
            code: Some("model_not_found".to_string()),
        });
        assert!(matches!(classify(&error), FailureKind::Permanent));
    }
}
