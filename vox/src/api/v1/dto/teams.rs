//! Team routing and vectorization DTOs for the v1 API.

use serde::{Deserialize, Serialize};

use crate::models::VectorizationStatus;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/teams/vectorize`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VectorizeRequest {
    /// Recompute embeddings even for tickets that already have one.
    #[serde(default)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Response for `POST /v1/teams/assign`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRunResponse {
    /// How many pending records received a team in this pass.
    pub routed: u64,
}

/// Response for `POST /v1/teams/vectorize`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VectorizeResponse {
    /// How many tickets were embedded in this pass.
    pub embedded: u64,
}

/// Response for `GET /v1/teams/vectorization-status`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VectorizationStatusResponse {
    /// Reference tickets in the corpus.
    pub total: u64,
    /// Tickets with a stored embedding.
    pub vectorized: u64,
    /// Percent vectorized, one decimal.
    pub percentage: f64,
    /// Whether an embedding provider is configured.
    pub provider_available: bool,
    /// Whether semantic scoring is usable (provider up, some tickets embedded).
    pub ready: bool,
}

impl From<VectorizationStatus> for VectorizationStatusResponse {
    fn from(status: VectorizationStatus) -> Self {
        Self {
            total: status.total,
            vectorized: status.vectorized,
            percentage: status.percentage,
            provider_available: status.provider_available,
            ready: status.ready,
        }
    }
}
