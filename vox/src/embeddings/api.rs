use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoxError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// OpenAI-compatible embeddings request body.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Outcome of a single upstream call, split by whether another attempt
/// could help.
enum CallError {
    Retryable(VoxError),
    Fatal(VoxError),
}

#[derive(Clone)]
pub struct EmbeddingApiClient {
    client: Client,
    config: ApiConfig,
}

impl EmbeddingApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VoxError::Embedding(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Embeds `texts` in a single request, retrying rate limits, server
    /// errors and network failures with exponential backoff. Returns one
    /// vector per input, in input order.
    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts.to_vec(),
        };

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            match self.request_embeddings(&request).await {
                Ok(vectors) => return Ok(vectors),
                Err(CallError::Retryable(error)) => last_error = Some(error),
                Err(CallError::Fatal(error)) => return Err(error),
            }
        }

        Err(last_error
            .unwrap_or_else(|| VoxError::Embedding("No response from embedding API".to_string())))
    }

    async fn request_embeddings(
        &self,
        request: &EmbeddingRequest<'_>,
    ) -> std::result::Result<Vec<Vec<f32>>, CallError> {
        let url = format!("{}/embeddings", self.config.base_url);
        let mut call = self.client.post(&url).json(request);
        if let Some(ref api_key) = self.config.api_key {
            call = call.bearer_auth(api_key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| CallError::Retryable(VoxError::Embedding(format!("Request failed: {e}"))))?;
        let status = response.status();

        if status.is_success() {
            let body: EmbeddingResponse = response.json().await.map_err(|e| {
                CallError::Fatal(VoxError::Embedding(format!("Failed to parse response: {e}")))
            })?;
            return Ok(body.data.into_iter().map(|d| d.embedding).collect());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(CallError::Retryable(VoxError::ApiRateLimit { retry_after }));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CallError::Fatal(VoxError::ApiAuth(body)));
        }
        if status.is_server_error() {
            return Err(CallError::Retryable(VoxError::Embedding(format!(
                "Server error {status}: {body}"
            ))));
        }

        Err(CallError::Fatal(VoxError::Embedding(format!(
            "API error {status}: {body}"
        ))))
    }
}
