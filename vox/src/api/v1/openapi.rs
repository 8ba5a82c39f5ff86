use axum::Json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};

use super::dto::{cache, chat, feedback, teams};
use super::handlers;
use super::response;

/// OpenAPI document for the v1 surface. Served as JSON at
/// `/api/v1/openapi.json` and rendered at `/api/v1/docs`; both are public.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vox API",
        description = "Customer feedback cache with scheduled refresh, similarity-based team routing, and grounded Q&A.",
    ),
    paths(
        handlers::health::health_check,
        handlers::feedback::list_feedback,
        handlers::feedback::get_feedback,
        handlers::cache::cache_status,
        handlers::cache::trigger_refresh,
        handlers::cache::invalidate_cache,
        handlers::teams::assign_pending,
        handlers::teams::vectorize_corpus,
        handlers::teams::vectorization_status,
        handlers::chat::ask,
    ),
    components(schemas(
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        feedback::FeedbackQuery,
        feedback::FeedbackItemResponse,
        feedback::ListFeedbackResponse,
        cache::RefreshRequest,
        cache::CacheStatusResponse,
        cache::RefreshAcceptedResponse,
        cache::InvalidateResponse,
        teams::VectorizeRequest,
        teams::AssignRunResponse,
        teams::VectorizeResponse,
        teams::VectorizationStatusResponse,
        chat::ChatRequest,
        chat::RelatedFeedbackItem,
        chat::RelatedTicketItem,
        chat::ChatResponse,
        handlers::health::HealthData,
        handlers::health::DatabaseHealth,
        handlers::health::EmbeddingsHealth,
        handlers::health::LlmHealth,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "feedback", description = "Cached feedback read endpoints"),
        (name = "cache", description = "Cache refresh lifecycle and status"),
        (name = "teams", description = "Team routing and reference-corpus vectorization"),
        (name = "chat", description = "Grounded Q&A over feedback and tickets"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&BearerAuthScheme),
)]
pub struct ApiDoc;

struct BearerAuthScheme;

impl Modify for BearerAuthScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
