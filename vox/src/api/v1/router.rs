use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let feedback = Router::new()
        .route("/", get(handlers::feedback::list_feedback))
        .route("/{id}", get(handlers::feedback::get_feedback));

    let cache = Router::new()
        .route("/status", get(handlers::cache::cache_status))
        .route("/refresh", post(handlers::cache::trigger_refresh))
        .route("/invalidate", post(handlers::cache::invalidate_cache));

    let teams = Router::new()
        .route("/assign", post(handlers::teams::assign_pending))
        .route("/vectorize", post(handlers::teams::vectorize_corpus))
        .route(
            "/vectorization-status",
            get(handlers::teams::vectorization_status),
        );

    let chat = Router::new().route("/", post(handlers::chat::ask));

    let public_routes = Router::new()
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .nest("/feedback", feedback)
        .nest("/cache", cache)
        .nest("/teams", teams)
        .nest("/chat", chat)
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
