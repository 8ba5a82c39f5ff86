//! v1 Team routing handlers.

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::v1::dto::{
    AssignRunResponse, VectorizationStatusResponse, VectorizeRequest, VectorizeResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse};

/// `POST /api/v1/teams/assign`
#[utoipa::path(
    post,
    path = "/api/v1/teams/assign",
    tag = "teams",
    operation_id = "teams.assign",
    responses(
        (status = 200, description = "Pending records routed", body = AssignRunResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn assign_pending(State(state): State<AppState>) -> ApiResponse<AssignRunResponse> {
    match state.assignment.assign_pending().await {
        Ok(routed) => ApiResponse::success(AssignRunResponse { routed }),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/teams/vectorize`
#[utoipa::path(
    post,
    path = "/api/v1/teams/vectorize",
    tag = "teams",
    operation_id = "teams.vectorize",
    request_body = VectorizeRequest,
    responses(
        (status = 200, description = "Reference corpus embedded", body = VectorizeResponse),
        (status = 500, description = "Embedding provider not configured", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn vectorize_corpus(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<VectorizeRequest>,
) -> ApiResponse<VectorizeResponse> {
    match state.assignment.vectorize_reference_corpus(req.force).await {
        Ok(embedded) => ApiResponse::success(VectorizeResponse { embedded }),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/teams/vectorization-status`
#[utoipa::path(
    get,
    path = "/api/v1/teams/vectorization-status",
    tag = "teams",
    operation_id = "teams.vectorizationStatus",
    responses(
        (status = 200, description = "Corpus embedding coverage", body = VectorizationStatusResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn vectorization_status(
    State(state): State<AppState>,
) -> ApiResponse<VectorizationStatusResponse> {
    match state.assignment.vectorization_status().await {
        Ok(status) => ApiResponse::success(status.into()),
        Err(e) => e.into(),
    }
}
