//! v1 Cache lifecycle handlers.

use axum::extract::State;
use chrono::Utc;

use crate::api::state::AppState;
use crate::api::v1::dto::{
    CacheStatusResponse, InvalidateResponse, RefreshAcceptedResponse, RefreshRequest,
};
use crate::api::v1::response::{ApiError, ApiResponse};

/// `GET /api/v1/cache/status`
#[utoipa::path(
    get,
    path = "/api/v1/cache/status",
    tag = "cache",
    operation_id = "cache.status",
    responses(
        (status = 200, description = "Cache freshness and refresh bookkeeping", body = CacheStatusResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn cache_status(State(state): State<AppState>) -> ApiResponse<CacheStatusResponse> {
    match state.engine.get_status().await {
        Ok(status) => ApiResponse::success(CacheStatusResponse::from_status(&status, Utc::now())),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/cache/refresh`
///
/// Runs the requested refresh inline and reports the committed total. A
/// concurrent run is never queued behind another; the caller gets
/// `refresh_busy` and retries later.
#[utoipa::path(
    post,
    path = "/api/v1/cache/refresh",
    tag = "cache",
    operation_id = "cache.refresh",
    request_body = RefreshRequest,
    responses(
        (status = 202, description = "Refresh ran to completion", body = RefreshAcceptedResponse),
        (status = 409, description = "A refresh is already running", body = ApiError),
        (status = 502, description = "Upstream fetch failed", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn trigger_refresh(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<RefreshRequest>,
) -> ApiResponse<RefreshAcceptedResponse> {
    match state.engine.try_refresh(req.mode).await {
        Ok(summary) => ApiResponse::accepted(summary.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/cache/invalidate`
///
/// Destructive: deletes every cached record and resets the status row.
#[utoipa::path(
    post,
    path = "/api/v1/cache/invalidate",
    tag = "cache",
    operation_id = "cache.invalidate",
    responses(
        (status = 200, description = "Cache cleared", body = InvalidateResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn invalidate_cache(State(state): State<AppState>) -> ApiResponse<InvalidateResponse> {
    match state.engine.invalidate().await {
        Ok(cleared) => ApiResponse::success(InvalidateResponse { cleared }),
        Err(e) => e.into(),
    }
}
