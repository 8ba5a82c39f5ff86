//! v1 Chat assistant handler.

use axum::extract::State;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::v1::dto::{ChatRequest, ChatResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};

/// `POST /api/v1/chat`
///
/// An empty question gets a canned prompt-for-detail answer rather than an
/// error, so conversational clients can render it inline.
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "chat",
    operation_id = "chat.ask",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer with cited feedback and tickets", body = ChatResponse),
        (status = 400, description = "Question too long", body = ApiError),
        (status = 501, description = "No LLM provider configured", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn ask(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<ChatRequest>,
) -> ApiResponse<ChatResponse> {
    if req.validate().is_err() {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            "Question too long (max 2000 characters)",
        );
    }

    match state.chat.ask(&req.question, req.team.as_deref()).await {
        Ok(answer) => ApiResponse::success(answer.into()),
        Err(e) => e.into(),
    }
}
