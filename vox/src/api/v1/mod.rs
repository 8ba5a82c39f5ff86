pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod router;


#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    use super::testing;
    use crate::api::routes::create_router;

    async fn test_app(api_keys: Vec<String>) -> (Router, NamedTempFile) {
        let (state, guard) = testing::state(api_keys).await;
        (create_router(state), guard)
    }

    async fn get(app: Router, uri: &str, api_key: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_chat(app: Router, question: &str) -> Response {
        let body = serde_json::json!({ "question": question }).to_string();
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn protected_route_requires_auth() {
        let (app, _db) = test_app(vec!["test-key".to_string()]).await;

        let response = post_chat(app, "hello").await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn unconfigured_keys_leave_instance_open() {
        let (app, _db) = test_app(vec![]).await;

        let response = get(app, "/api/v1/feedback", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["feedback"], serde_json::json!([]));
        assert_eq!(json["meta"]["total"], 0);
    }

    #[tokio::test]
    async fn valid_key_grants_access() {
        let (app, _db) = test_app(vec!["secret".to_string()]).await;

        let response = get(app, "/api/v1/feedback", Some("secret")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _db) = test_app(vec!["secret".to_string()]).await;

        let response = get(app, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_json_is_public_and_valid() {
        let (app, _db) = test_app(vec!["secret".to_string()]).await;

        let response = get(app, "/api/v1/openapi.json", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let version = json["openapi"].as_str().expect("openapi version string");
        assert!(version.starts_with("3"), "unexpected version: {version}");
    }

    #[tokio::test]
    async fn success_envelope_has_data_no_error() {
        let (app, _db) = test_app(vec!["k".to_string()]).await;

        let response = get(app, "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json.get("data").is_some());
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn error_envelope_has_error_no_data() {
        let (app, _db) = test_app(vec!["key".to_string()]).await;

        let response = post_chat(app, "hello").await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert!(json.get("error").is_some());
        assert!(json.get("data").is_none());
        assert!(json["error"]["code"].is_string());
        assert!(json["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn unknown_record_returns_not_found_envelope() {
        let (app, _db) = test_app(vec![]).await;

        let response = get(app, "/api/v1/feedback/recMissing", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn cache_status_reports_empty_cache() {
        let (app, _db) = test_app(vec![]).await;

        let response = get(app, "/api/v1/cache/status", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["recordCount"], 0);
        assert_eq!(json["data"]["running"], false);
        assert!(json["data"]["nextFullRefresh"].is_string());
    }

    #[tokio::test]
    async fn chat_on_empty_cache_returns_canned_answer() {
        let (app, _db) = test_app(vec![]).await;

        // With nothing cached the no-context answer wins before the LLM
        // availability check, so no provider is needed here.
        let response = post_chat(app, "what are users saying?").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["data"]["answer"]
            .as_str()
            .unwrap()
            .contains("couldn't find any relevant"));
    }
}
