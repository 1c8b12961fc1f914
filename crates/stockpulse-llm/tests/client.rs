//! Integration tests for `OpenRouterClient` using wiremock HTTP mocks.

use stockpulse_llm::{CompletionBackend, LlmError, ModelDescriptor, OpenRouterClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenRouterClient {
    OpenRouterClient::with_base_url("test-key", 30, 2000, base_url)
        .expect("client construction should not fail")
}

fn test_model() -> ModelDescriptor {
    ModelDescriptor::new("test/model-a:free", 128_000, 0)
}

#[tokio::test]
async fn complete_returns_message_content() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "choices": [
            { "message": { "role": "assistant", "content": "{\"tickers\": {}}" } }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "test/model-a:free",
            "temperature": 0.1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let content = client
        .complete(&test_model(), "extract tickers")
        .await
        .expect("should return content");

    assert_eq!(content, "{\"tickers\": {}}");
}

#[tokio::test]
async fn http_429_maps_to_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.complete(&test_model(), "prompt").await;

    assert!(
        matches!(result, Err(LlmError::RateLimited { ref model }) if model == "test/model-a:free"),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn api_error_body_maps_to_api_error() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "error": { "message": "model overloaded", "code": 502 }
    });

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.complete(&test_model(), "prompt").await;

    match result {
        Err(LlmError::Api { message, .. }) => assert_eq!(message, "model overloaded"),
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.complete(&test_model(), "prompt").await;

    assert!(
        matches!(result, Err(LlmError::Api { .. })),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn non_2xx_status_is_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.complete(&test_model(), "prompt").await;

    assert!(
        matches!(result, Err(LlmError::Http(_))),
        "expected Http error, got: {result:?}"
    );
}
