use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::v1;
use super::AppState;

/// Top-level router: a public health probe plus the versioned API, with
/// permissive CORS and request tracing applied to everything.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(v1::handlers::health::health_check))
        .nest("/api/v1", v1::router::v1_router(state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
