use crate::config::EmbeddingsConfig;
use crate::error::{Result, VoxError};

use super::api::{ApiConfig, EmbeddingApiClient, DEFAULT_BASE_URL};

#[derive(Clone)]
enum EmbeddingBackend {
    Remote {
        client: EmbeddingApiClient,
        batch_size: usize,
    },
    /// No usable provider. Callers are expected to check `is_available` and
    /// fall back to lexical matching instead of calling `embed`.
    Unavailable { reason: String },
}

#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: EmbeddingBackend,
    dimensions: usize,
}

impl EmbeddingProvider {
    /// Never fails: a missing API key degrades to an unavailable provider so
    /// the rest of the system can run with lexical matching only.
    pub fn new(config: &EmbeddingsConfig) -> Self {
        let backend = if config.api_key.is_none() {
            EmbeddingBackend::Unavailable {
                reason: "no embedding API key configured".to_string(),
            }
        } else {
            let api_config = ApiConfig {
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                timeout_secs: config.timeout_secs,
                max_retries: config.max_retries,
            };
            match EmbeddingApiClient::new(api_config) {
                Ok(client) => EmbeddingBackend::Remote {
                    client,
                    batch_size: config.batch_size.max(1),
                },
                Err(e) => EmbeddingBackend::Unavailable {
                    reason: e.to_string(),
                },
            }
        };

        Self {
            backend,
            dimensions: config.dimensions,
        }
    }

    /// Provider that always reports unavailable, forcing the lexical path.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: EmbeddingBackend::Unavailable {
                reason: reason.to_string(),
            },
            dimensions: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backend, EmbeddingBackend::Remote { .. })
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            EmbeddingBackend::Remote { .. } => None,
            EmbeddingBackend::Unavailable { reason } => Some(reason),
        }
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match &self.backend {
            EmbeddingBackend::Remote { client, batch_size } => {
                let mut all_embeddings = Vec::with_capacity(texts.len());
                for batch in texts.chunks(*batch_size) {
                    let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
                    let mut embedded = client.embed(&refs).await?;
                    all_embeddings.append(&mut embedded);
                }
                Ok(all_embeddings)
            }
            EmbeddingBackend::Unavailable { reason } => Err(VoxError::Embedding(format!(
                "Embedding provider unavailable: {reason}"
            ))),
        }
    }

    pub async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed(vec![text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VoxError::Embedding("No embedding generated".to_string()))
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Cosine similarity over two vectors. Mismatched lengths, empty input, and
/// zero-norm vectors all score 0.0 so callers never divide by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
