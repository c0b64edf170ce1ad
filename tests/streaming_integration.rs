//! Ollama client against a mock HTTP server

use bidrag::bootstrap::{Bootstrap, BootstrapStatus};
use bidrag::errors::RagError;
use bidrag::streaming::{Generator, OllamaClient};
use futures_util::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ndjson(lines: &[serde_json::Value]) -> String {
    lines.iter().map(|l| format!("{}\n", l)).collect()
}

async fn server_with_body(body: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "gemma3", "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_stream_fragments_until_done() {
    let server = server_with_body(ndjson(&[
        json!({ "model": "gemma3", "response": "서울시와 ", "done": false }),
        json!({ "model": "gemma3", "response": "경기도의 도로 사업입니다.", "done": false }),
        json!({ "model": "gemma3", "response": "", "done": true, "total_duration": 1200 }),
        json!({ "model": "gemma3", "response": "무시됨", "done": false }),
    ]))
    .await;

    let client = OllamaClient::with_config(&server.uri(), "gemma3").unwrap();
    let fragments: Vec<String> = client
        .stream("도로 공사".to_string())
        .await
        .unwrap()
        .into_stream()
        .map(|f| f.unwrap())
        .collect()
        .await;

    assert_eq!(fragments, vec!["서울시와 ", "경기도의 도로 사업입니다."]);
}

#[tokio::test]
async fn test_malformed_chunk_is_generation_error() {
    let mut body = ndjson(&[json!({ "response": "앞", "done": false })]);
    body.push_str("{\"response\": \n");
    let server = server_with_body(body).await;

    let client = OllamaClient::with_config(&server.uri(), "gemma3").unwrap();
    let mut response = client.generate_stream("질문".to_string()).await.unwrap();

    assert_eq!(response.next_fragment().await.unwrap().unwrap(), "앞");
    let err = response.next_fragment().await.unwrap().unwrap_err();
    assert!(matches!(err, RagError::GenerationService(_)));
    assert!(response.next_fragment().await.is_none());
}

#[tokio::test]
async fn test_in_band_error_is_generation_error() {
    let server = server_with_body(ndjson(&[json!({ "error": "model runner crashed" })])).await;

    let client = OllamaClient::with_config(&server.uri(), "gemma3").unwrap();
    let err = client
        .generate_stream("질문".to_string())
        .await
        .unwrap()
        .collect_text()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("model runner crashed"));
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model 'gemma3' not found"))
        .mount(&server)
        .await;

    let client = OllamaClient::with_config(&server.uri(), "gemma3").unwrap();
    let err = client.generate_stream("질문".to_string()).await.unwrap_err();
    assert!(matches!(err, RagError::GenerationService(_)));
    assert!(err.to_string().contains("404"));
}

async fn server_with_models(models: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    let models: Vec<_> = models.iter().map(|name| json!({ "name": name })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "0.6.0" })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_bootstrap_ready_through_client() {
    let server = server_with_models(&["gemma3:latest", "llama3.1:8b"]).await;

    let client = OllamaClient::with_config(&server.uri(), "gemma3").unwrap();
    let bootstrap = Bootstrap::new(client);
    assert!(bootstrap.check_ollama_running().await);
    assert_eq!(
        bootstrap.list_models().await.unwrap(),
        vec!["gemma3:latest".to_string(), "llama3.1:8b".to_string()]
    );
    assert_eq!(bootstrap.check().await.unwrap(), BootstrapStatus::Ready);
}

#[tokio::test]
async fn test_bootstrap_reports_missing_model() {
    let server = server_with_models(&["llama3.1:8b"]).await;

    let client = OllamaClient::with_config(&server.uri(), "gemma3:12b").unwrap();
    assert_eq!(
        Bootstrap::new(client).check().await.unwrap(),
        BootstrapStatus::ModelNotAvailable("gemma3:12b".to_string())
    );
}
