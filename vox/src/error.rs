use thiserror::Error;

/// Unified error type for the service.
///
/// HTTP status mapping lives in the v1 response layer; this type only
/// carries classification and context.
#[derive(Error, Debug)]
pub enum VoxError {
    #[error("Storage error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Upstream returned a non-success status other than rate limiting.
    #[error("Upstream error: HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Upstream asked us to back off. Carries the `Retry-After` value when
    /// the response included one.
    #[error("API rate limit exceeded, retry after {retry_after:?} seconds")]
    ApiRateLimit { retry_after: Option<u64> },

    #[error("API authentication error: {0}")]
    ApiAuth(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another refresh holds the run lock.
    #[error("A refresh is already running")]
    RefreshBusy,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, VoxError>;
