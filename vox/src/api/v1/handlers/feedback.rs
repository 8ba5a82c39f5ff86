//! v1 Feedback read handlers.

use axum::extract::{Path, State};
use axum_extra::extract::Query;

use crate::api::state::AppState;
use crate::api::v1::dto::{FeedbackItemResponse, FeedbackQuery, ListFeedbackResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};

/// `GET /api/v1/feedback`
#[utoipa::path(
    get,
    path = "/api/v1/feedback",
    tag = "feedback",
    operation_id = "feedback.list",
    params(FeedbackQuery),
    responses(
        (status = 200, description = "Filtered feedback list", body = ListFeedbackResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<FeedbackQuery>,
) -> ApiResponse<ListFeedbackResponse> {
    match state.feedback.list(&query.into()).await {
        Ok(views) => {
            let feedback: Vec<FeedbackItemResponse> = views.into_iter().map(Into::into).collect();
            let meta = ResponseMeta {
                total: Some(feedback.len() as u64),
            };
            ApiResponse::success_with_meta(ListFeedbackResponse { feedback }, meta)
        }
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/feedback/{id}`
#[utoipa::path(
    get,
    path = "/api/v1/feedback/{id}",
    tag = "feedback",
    operation_id = "feedback.get",
    params(("id" = String, Path, description = "Upstream record ID")),
    responses(
        (status = 200, description = "Projected feedback record", body = FeedbackItemResponse),
        (status = 404, description = "No record with this ID", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<FeedbackItemResponse> {
    match state.feedback.get(&id).await {
        Ok(view) => ApiResponse::success(view.into()),
        Err(e) => e.into(),
    }
}
