use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;

/// Health report returned inside the v1 envelope.
///
/// Checks are shallow. The database check round-trips the connection; the
/// provider entries report configuration, not live reachability.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub embeddings: EmbeddingsHealth,
    pub llm: LlmHealth,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseHealth {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EmbeddingsHealth {
    pub status: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_health(&state).await,
        embeddings: embeddings_health(&state),
        llm: llm_health(&state),
    })
}

async fn database_health(state: &AppState) -> DatabaseHealth {
    let status = match state.db.sync().await {
        Ok(_) => "ok",
        Err(_) => "error",
    };
    DatabaseHealth {
        status: status.to_string(),
    }
}

fn embeddings_health(state: &AppState) -> EmbeddingsHealth {
    EmbeddingsHealth {
        status: availability(state.embeddings.is_available()),
        model: state.config.embeddings.model.clone(),
        dimensions: state.embeddings.dimensions(),
    }
}

fn llm_health(state: &AppState) -> LlmHealth {
    LlmHealth {
        status: availability(state.llm.is_available()),
        model: state.llm.config().map(|config| config.model.clone()),
    }
}

fn availability(available: bool) -> String {
    if available { "available" } else { "unavailable" }.to_string()
}
