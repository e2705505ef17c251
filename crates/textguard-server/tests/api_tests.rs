//! HTTP API tests driven through the router

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use textguard_classifiers::{Analyzer, ClassificationResult, Classifier};
use textguard_core::{Error, Result};
use textguard_server::{build_app, ServerSettings, ServiceState};

/// Pipeline-style mock: `LABEL_1` for text containing "hate", else `LABEL_0`
struct MockModel;

#[async_trait]
impl Classifier for MockModel {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let label = if text.contains("hate") { "LABEL_1" } else { "LABEL_0" };
        Ok(ClassificationResult::new(label, 0.92))
    }

    fn name(&self) -> &str {
        "mock-model"
    }
}

struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
        Err(Error::classifier("inference backend unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct PanickingClassifier;

#[async_trait]
impl Classifier for PanickingClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
        panic!("tensor shape mismatch");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

fn app_with(state: ServiceState) -> Router {
    build_app(Arc::new(state), &ServerSettings::default())
}

fn keyword_app() -> Router {
    app_with(ServiceState::ready(
        Analyzer::keyword().unwrap(),
        "simple-keyword-analyzer",
    ))
}

fn model_app(classifier: impl Classifier + 'static) -> Router {
    app_with(ServiceState::ready(
        Analyzer::new(Box::new(classifier), ["LABEL_1"]),
        "unitary/toxic-bert",
    ))
}

fn loading_app() -> Router {
    app_with(ServiceState::loading("unitary/toxic-bert"))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn score(body: &Value) -> f64 {
    body["score"].as_f64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(keyword_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "classifier_loaded": true }));

    let (status, body) = send(loading_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classifier_loaded"], false);
}

#[tokio::test]
async fn test_stats() {
    let (status, body) = send(keyword_app(), get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "model": "simple-keyword-analyzer",
            "classifier_loaded": true,
            "endpoints": {
                "analyze": "/analyze",
                "analyze_batch": "/analyze-batch",
                "health": "/health"
            }
        })
    );
}

#[tokio::test]
async fn test_analyze_keyword_toxic() {
    let (status, body) = send(
        keyword_app(),
        post_json("/analyze", r#"{"text": "You are so stupid and terrible"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "toxic");
    assert!((score(&body) - 0.4).abs() < 1e-6);
    assert_eq!(body["text_length"], 30);
}

#[tokio::test]
async fn test_analyze_keyword_safe() {
    let (status, body) = send(
        keyword_app(),
        post_json("/analyze", r#"{"text": "Have a nice day"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "safe");
    assert_eq!(score(&body), 0.0);
    assert_eq!(body["text_length"], 15);
}

#[tokio::test]
async fn test_text_length_counts_trimmed_characters() {
    let (status, body) = send(
        keyword_app(),
        post_json("/analyze", r#"{"text": "   héllo wörld  "}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text_length"], 11);
}

#[tokio::test]
async fn test_analyze_model_label_mapping() {
    let (status, body) = send(
        model_app(MockModel),
        post_json("/analyze", r#"{"text": "I hate mondays"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "toxic");
    assert!((score(&body) - 0.92).abs() < 1e-6);

    let (_, body) = send(
        model_app(MockModel),
        post_json("/analyze", r#"{"text": "I love mondays"}"#),
    )
    .await;
    assert_eq!(body["label"], "safe");
}

#[tokio::test]
async fn test_analyze_rejects_empty_text() {
    for app in [keyword_app(), loading_app()] {
        for payload in [r#"{"text": ""}"#, r#"{"text": "   \n\t "}"#, r#"{"other": 1}"#] {
            let (status, body) = send(app.clone(), post_json("/analyze", payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
            assert_eq!(body, json!({ "error": "No text provided" }));
        }
    }
}

#[tokio::test]
async fn test_analyze_rejects_missing_json() {
    for payload in ["", "not json", "{}", "null"] {
        let (status, body) = send(keyword_app(), post_json("/analyze", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {:?}", payload);
        assert_eq!(body, json!({ "error": "No JSON data provided" }));
    }

    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .body(Body::from(r#"{"text": "hello"}"#))
        .unwrap();
    let (status, body) = send(keyword_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");
}

#[tokio::test]
async fn test_analyze_unavailable_while_loading() {
    let (status, body) = send(
        loading_app(),
        post_json("/analyze", r#"{"text": "hello there"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "Classifier not loaded" }));

    let (status, _) = send(
        loading_app(),
        post_json("/analyze-batch", r#"{"texts": ["hello"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_analyze_batch() {
    let (status, body) = send(
        model_app(MockModel),
        post_json("/analyze-batch", r#"{"texts": ["hate this", "great job"]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_analyzed"], 2);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["index"], 0);
    assert_eq!(results[0]["label"], "toxic");
    assert_eq!(results[0]["text"], "hate this");
    assert_eq!(results[1]["index"], 1);
    assert_eq!(results[1]["label"], "safe");
    assert_eq!(results[1]["text"], "great job");
}

#[tokio::test]
async fn test_analyze_batch_truncates_echo() {
    let long = "a".repeat(150);
    let exact = "b".repeat(100);
    let payload = json!({ "texts": [long, exact] }).to_string();

    let (status, body) = send(keyword_app(), post_json("/analyze-batch", &payload)).await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["text"], format!("{}...", "a".repeat(100)));
    assert_eq!(results[1]["text"], "b".repeat(100));
}

#[tokio::test]
async fn test_analyze_batch_rejects_bad_payloads() {
    for (payload, message) in [
        (r#"{}"#, "No texts array provided"),
        (r#"{"text": "one"}"#, "No texts array provided"),
        (r#"{"texts": []}"#, "Invalid texts array"),
        (r#"{"texts": "one"}"#, "Invalid texts array"),
        (r#"{"texts": ["one", 2]}"#, "Invalid texts array"),
        ("garbage", "No JSON data provided"),
    ] {
        let (status, body) = send(keyword_app(), post_json("/analyze-batch", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body["error"], message, "payload {}", payload);
    }
}

#[tokio::test]
async fn test_classifier_failure_is_internal_error() {
    let (status, body) = send(
        model_app(FailingClassifier),
        post_json("/analyze", r#"{"text": "hello"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("inference backend unavailable"));

    // no partial results for a failed batch
    let (status, body) = send(
        model_app(FailingClassifier),
        post_json("/analyze-batch", r#"{"texts": ["one", "two"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("results").is_none());
}

#[tokio::test]
async fn test_panic_is_caught() {
    let (status, body) = send(
        model_app(PanickingClassifier),
        post_json("/analyze", r#"{"text": "hello"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, body) = send(keyword_app(), get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Endpoint not found" }));

    // metrics route only exists when a recorder handle is attached
    let (status, _) = send(keyword_app(), get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_route() {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    let state = ServiceState::ready(Analyzer::keyword().unwrap(), "simple-keyword-analyzer")
        .with_metrics(handle);

    let response = app_with(state).oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "chrome-extension://abcdefghijklmnop")
        .body(Body::empty())
        .unwrap();

    let response = keyword_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_body_limit() {
    let settings = ServerSettings {
        max_body_bytes: 64,
        ..Default::default()
    };
    let state = ServiceState::ready(Analyzer::keyword().unwrap(), "simple-keyword-analyzer");
    let app = build_app(Arc::new(state), &settings);

    let payload = json!({ "text": "x".repeat(200) }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_body_limit_without_content_length() {
    let settings = ServerSettings {
        max_body_bytes: 64,
        ..Default::default()
    };
    let state = ServiceState::ready(Analyzer::keyword().unwrap(), "simple-keyword-analyzer");
    let app = build_app(Arc::new(state), &settings);

    // no Content-Length header, so the limit trips while the body is buffered
    let payload = json!({ "text": "x".repeat(200) }).to_string();
    let (status, body) = send(app, post_json("/analyze", &payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({ "error": "Request body too large" }));
}

#[tokio::test]
async fn test_separator_characters_are_trimmed() {
    for payload in [r#"{"text": "\u001c"}"#, r#"{"text": " \u001f\u001d "}"#] {
        let (status, body) = send(keyword_app(), post_json("/analyze", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body, json!({ "error": "No text provided" }));
    }

    let (status, body) = send(
        keyword_app(),
        post_json("/analyze", r#"{"text": "\u001chello\u001e"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text_length"], 5);
}
