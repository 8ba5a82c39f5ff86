//! Response envelope and error contract for the v1 API.
//!
//! Every endpoint wraps its payload in [`ApiResponse<T>`]:
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "total": 42 },
//!   "error": { "code": "not_found", "message": "..." }
//! }
//! ```
//!
//! `data` and `error` are mutually exclusive; `meta` rides along on list
//! responses. Error codes are snake_case machine strings, each with a fixed
//! HTTP status. Clients should branch on `error.code`, never on message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::VoxError;

/// Machine-readable error classification, serialized as snake_case
/// (e.g. `"refresh_busy"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request or failed validation. HTTP 400.
    InvalidRequest,
    /// Missing or rejected credentials. HTTP 401.
    Unauthorized,
    /// No such resource. HTTP 404.
    NotFound,
    /// A refresh is already running; retry once it completes. HTTP 409.
    RefreshBusy,
    /// An upstream dependency (Airtable, embedding or LLM endpoint) failed.
    /// HTTP 502.
    UpstreamError,
    /// Unexpected server-side failure. Internal details are never sent to
    /// the client. HTTP 500.
    InternalError,
    /// The feature is not configured on this instance. HTTP 501.
    NotImplemented,
}

impl ErrorCode {
    /// The fixed HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RefreshBusy => StatusCode::CONFLICT,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// The wire string, matching the serde representation.
    fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::RefreshBusy => "refresh_busy",
            Self::UpstreamError => "upstream_error",
            Self::InternalError => "internal_error",
            Self::NotImplemented => "not_implemented",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload inside the envelope:
/// `{ "code": "not_found", "message": "Feedback record 'rec123'" }`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Safe for end-user display; internals stay in the logs.
    pub message: String,
}

/// List metadata.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ResponseMeta {
    /// Number of items in the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// The v1 envelope. Success responses carry `data`, error responses carry
/// `error`; the HTTP status comes from the error code or the constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// Not serialized; consumed by `IntoResponse`.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    fn payload(data: T, status: StatusCode) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status,
        }
    }

    /// Success with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self::payload(data, StatusCode::OK)
    }

    /// Success with data and list metadata (HTTP 200).
    pub fn success_with_meta(data: T, meta: ResponseMeta) -> Self {
        Self {
            meta: Some(meta),
            ..Self::payload(data, StatusCode::OK)
        }
    }

    /// Accepted (HTTP 202), used by the refresh trigger.
    pub fn accepted(data: T) -> Self {
        Self::payload(data, StatusCode::ACCEPTED)
    }

    /// Error response; the HTTP status follows the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            meta: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self) {
            Ok(body) => (self.status, Json(body)).into_response(),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": {
                        "code": ErrorCode::InternalError.as_str(),
                        "message": "An internal error occurred"
                    }
                })),
            )
                .into_response(),
        }
    }
}

impl<T: Serialize> From<VoxError> for ApiResponse<T> {
    /// Maps domain errors onto the wire contract.
    ///
    /// Internal details never leak: `internal_error` responses carry a
    /// generic message and the real error goes to `tracing::error!`.
    /// Upstream failures (Airtable, embedding/LLM endpoints) map to
    /// `upstream_error` so callers can tell their request apart from our
    /// dependencies.
    fn from(err: VoxError) -> Self {
        match err {
            VoxError::NotFound(ref msg) => ApiResponse::error(ErrorCode::NotFound, msg.clone()),

            VoxError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            VoxError::Json(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            VoxError::RefreshBusy => {
                ApiResponse::error(ErrorCode::RefreshBusy, "A refresh is already running")
            }

            VoxError::Upstream { status, ref message } => ApiResponse::error(
                ErrorCode::UpstreamError,
                format!("Upstream error (HTTP {status}): {message}"),
            ),

            VoxError::ApiAuth(_) => {
                ApiResponse::error(ErrorCode::UpstreamError, "Upstream authentication failed")
            }

            VoxError::ApiRateLimit { retry_after } => {
                let msg = match retry_after {
                    Some(secs) => {
                        format!("Upstream rate limit exceeded, retry after {secs} seconds")
                    }
                    None => "Upstream rate limit exceeded".to_string(),
                };
                ApiResponse::error(ErrorCode::UpstreamError, msg)
            }

            VoxError::LlmRateLimit { retry_after } => {
                let msg = match retry_after {
                    Some(secs) => {
                        format!("LLM rate limit exceeded, retry after {secs} seconds")
                    }
                    None => "LLM rate limit exceeded".to_string(),
                };
                ApiResponse::error(ErrorCode::UpstreamError, msg)
            }

            VoxError::LlmUnavailable(ref msg) => {
                ApiResponse::error(ErrorCode::NotImplemented, msg.clone())
            }

            VoxError::Http(ref e) => {
                tracing::error!(error = %e, "Upstream request failed");
                ApiResponse::error(ErrorCode::UpstreamError, "Upstream request failed")
            }

            ref internal @ (VoxError::Database(_)
            | VoxError::Embedding(_)
            | VoxError::Io(_)
            | VoxError::Internal(_)
            | VoxError::Llm(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}
