//! Tests for the embedding API client and the provider wrapper, with
//! wiremock standing in for the OpenAI-compatible endpoint.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::EmbeddingsConfig;
use crate::embeddings::api::{ApiConfig, EmbeddingApiClient};
use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::error::VoxError;

fn test_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        api_key: Some("test-api-key".to_string()),
        model: "text-embedding-3-small".to_string(),
        timeout_secs: 10,
        max_retries: 3,
    }
}

fn provider_config(base_url: &str, batch_size: usize) -> EmbeddingsConfig {
    EmbeddingsConfig {
        model: "text-embedding-3-small".to_string(),
        api_key: Some("test-api-key".to_string()),
        base_url: Some(base_url.to_string()),
        dimensions: 3,
        batch_size,
        timeout_secs: 10,
        max_retries: 3,
    }
}

fn embedding_response(embeddings: Vec<Vec<f32>>) -> serde_json::Value {
    json!({
        "data": embeddings.into_iter().map(|e| json!({ "embedding": e })).collect::<Vec<_>>()
    })
}

async fn mount_success(server: &MockServer, vectors: Vec<Vec<f32>>) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_response(vectors)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_embed_returns_vectors_in_input_order() {
    let mock_server = MockServer::start().await;
    mount_success(
        &mock_server,
        vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]],
    )
    .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let embeddings = client.embed(&["first", "second"]).await.unwrap();

    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[0], vec![0.1, 0.2, 0.3]);
    assert_eq!(embeddings[1], vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn test_embed_sends_openai_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_json(json!({
            "model": "text-embedding-3-small",
            "input": ["hello world"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![0.1, 0.2, 0.3]])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    assert!(client.embed(&["hello world"]).await.is_ok());
}

#[tokio::test]
async fn test_embed_sends_bearer_authorization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![0.1, 0.2, 0.3]])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    assert!(client.embed(&["test"]).await.is_ok());
}

#[tokio::test]
async fn test_embed_retries_rate_limited_requests() {
    let mock_server = MockServer::start().await;

    // Two 429s, then the general success mock takes over.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "error": "rate limited" }))
                .insert_header("retry-after", "1"),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_success(&mock_server, vec![vec![0.1, 0.2, 0.3]]).await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let embeddings = client.embed(&["test"]).await.expect("retry should recover");
    assert_eq!(embeddings.len(), 1);
}

#[tokio::test]
async fn test_embed_gives_up_after_max_retries() {
    let mock_server = MockServer::start().await;

    // 1 initial attempt + 2 retries.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "error": "rate limited" })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ApiConfig {
        max_retries: 2,
        ..test_config(&mock_server.uri())
    };
    let client = EmbeddingApiClient::new(config).unwrap();
    let error = client.embed(&["test"]).await.unwrap_err();

    assert!(error.to_string().contains("rate limit"));
}

#[tokio::test]
async fn test_embed_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "internal" })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_success(&mock_server, vec![vec![0.1, 0.2, 0.3]]).await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    assert!(client.embed(&["test"]).await.is_ok());
}

#[tokio::test]
async fn test_embed_fails_fast_on_auth_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "bad key" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let error = client.embed(&["test"]).await.unwrap_err();

    assert!(matches!(error, VoxError::ApiAuth(_)));
}

#[tokio::test]
async fn test_embed_does_not_retry_client_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "bad request" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    assert!(client.embed(&["test"]).await.is_err());
}

#[tokio::test]
async fn test_embed_rejects_malformed_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": "shape" })))
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    assert!(client.embed(&["test"]).await.is_err());
}

#[tokio::test]
async fn test_provider_without_key_is_unavailable() {
    let config = EmbeddingsConfig {
        api_key: None,
        ..provider_config("http://unused", 64)
    };
    let provider = EmbeddingProvider::new(&config);

    assert!(!provider.is_available());
    assert!(provider.unavailable_reason().is_some());
    assert!(provider.embed(vec!["text".to_string()]).await.is_err());
}

#[tokio::test]
async fn test_provider_embed_empty_input_is_noop() {
    let config = EmbeddingsConfig {
        api_key: None,
        ..provider_config("http://unused", 64)
    };
    let provider = EmbeddingProvider::new(&config);

    // Empty input short-circuits before the backend is consulted.
    assert_eq!(
        provider.embed(Vec::new()).await.unwrap(),
        Vec::<Vec<f32>>::new()
    );
}

#[tokio::test]
async fn test_provider_splits_input_into_batches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(|req: &wiremock::Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            let inputs = body["input"].as_array().unwrap().len();
            ResponseTemplate::new(200)
                .set_body_json(embedding_response(vec![vec![0.1, 0.2, 0.3]; inputs]))
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let provider = EmbeddingProvider::new(&provider_config(&mock_server.uri(), 2));
    let embeddings = provider
        .embed(vec![
            "one".to_string(),
            "two".to_string(),
            "three".to_string(),
        ])
        .await
        .unwrap();

    // Three texts at batch size two is two requests.
    assert_eq!(embeddings.len(), 3);
}

#[test]
fn test_cosine_identical_vectors() {
    let v = vec![0.5, 0.5, 0.7071];
    let sim = cosine_similarity(&v, &v);
    assert!((sim - 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_orthogonal_vectors() {
    let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
    assert!(sim.abs() < 1e-6);
}

#[test]
fn test_cosine_mismatched_or_empty_is_zero() {
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
}
