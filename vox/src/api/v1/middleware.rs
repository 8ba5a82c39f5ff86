//! Bearer token authentication for protected v1 routes.
//!
//! Auth is opt-in: an instance with no keys in `VOX_API_KEYS` runs open,
//! which is the expected mode for private-network deployments. Configuring
//! at least one key turns on `Authorization: Bearer <key>` checks, and
//! rejections use the standard [`ApiResponse`] error envelope.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;
use crate::api::v1::response::{ApiResponse, ErrorCode};

/// Route-layer middleware enforcing Bearer auth on the v1 API.
///
/// Requests pass straight through when the instance has no configured keys.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let keys = &state.config.server.api_keys;
    if keys.is_empty() {
        return next.run(request).await;
    }

    match bearer_token(&request) {
        Ok(token) if keys.iter().any(|key| key == token) => next.run(request).await,
        Ok(_) => reject("Invalid API key"),
        Err(message) => reject(message),
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request) -> Result<&str, &'static str> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or("Missing authorization header")?;

    header
        .strip_prefix("Bearer ")
        .ok_or("Malformed authorization header. Expected: Bearer <token>")
}

fn reject(message: &str) -> Response {
    ApiResponse::<()>::error(ErrorCode::Unauthorized, message).into_response()
}
