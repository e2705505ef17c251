//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Instant;
use textguard_core::{echo_text, Label, Verdict};
use tracing::{debug, info};

use crate::error::{AppError, INVALID_TEXTS, NOT_FOUND, NO_JSON, NO_TEXT, NO_TEXTS};
use crate::state::AppState;

/// Characters of submitted text shown in debug logs
const LOG_PREVIEW_CHARS: usize = 50;

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(analyze))
        .route("/analyze-batch", post(analyze_batch))
        .route("/stats", get(stats));

    if state.metrics().is_some() {
        router = router.route("/metrics", get(metrics));
    }

    router.fallback(fallback).with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub classifier_loaded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub label: Label,
    pub score: f32,
    pub text_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub label: Label,
    pub score: f32,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItem>,
    pub total_analyzed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub model: String,
    pub classifier_loaded: bool,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Endpoints {
    pub analyze: String,
    pub analyze_batch: String,
    pub health: String,
}

/// Single-text request: `text` must be a string with non-whitespace content
#[derive(Debug)]
struct AnalyzeRequest {
    text: String,
}

impl AnalyzeRequest {
    fn from_body(body: Value) -> Result<Self, AppError> {
        let fields = match body {
            Value::Object(fields) if !fields.is_empty() => fields,
            _ => return Err(AppError::bad_request(NO_JSON)),
        };

        match fields.get("text").and_then(Value::as_str).map(trim_text) {
            Some(text) if !text.is_empty() => Ok(Self {
                text: text.to_string(),
            }),
            _ => Err(AppError::bad_request(NO_TEXT)),
        }
    }
}

/// Batch request: `texts` must be a non-empty array of strings
#[derive(Debug)]
struct BatchRequest {
    texts: Vec<String>,
}

impl BatchRequest {
    fn from_body(body: Value) -> Result<Self, AppError> {
        let mut fields = match body {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        let items = match fields.remove("texts") {
            None | Some(Value::Null) => return Err(AppError::bad_request(NO_TEXTS)),
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(_) => return Err(AppError::bad_request(INVALID_TEXTS)),
        };

        let texts = items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Ok(text),
                _ => Err(AppError::bad_request(INVALID_TEXTS)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { texts })
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("textguard_requests_total", "endpoint" => "health").increment(1);

    Json(HealthResponse {
        status: "healthy".to_string(),
        classifier_loaded: state.classifier_loaded(),
    })
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    metrics::counter!("textguard_requests_total", "endpoint" => "analyze").increment(1);

    let Json(body) = payload?;
    let request = AnalyzeRequest::from_body(body)?;
    let analyzer = state.analyzer()?;

    debug!("Analyzing text: {}...", preview(&request.text));

    let start = Instant::now();
    let verdict = analyzer.analyze(&request.text).await?;
    record_inference(start, std::slice::from_ref(&verdict));

    info!("Analysis result: {} ({:.3})", verdict.label, verdict.score);

    Ok(Json(AnalyzeResponse {
        label: verdict.label,
        score: verdict.score,
        text_length: request.text.chars().count(),
    }))
}

async fn analyze_batch(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchResponse>, AppError> {
    metrics::counter!("textguard_requests_total", "endpoint" => "analyze_batch").increment(1);

    let Json(body) = payload?;
    let request = BatchRequest::from_body(body)?;
    let analyzer = state.analyzer()?;

    info!("Analyzing batch of {} texts", request.texts.len());

    let start = Instant::now();
    let verdicts = analyzer.analyze_batch(&request.texts).await?;
    record_inference(start, &verdicts);

    let results: Vec<BatchItem> = request
        .texts
        .iter()
        .zip(verdicts)
        .enumerate()
        .map(|(index, (text, verdict))| BatchItem {
            index,
            label: verdict.label,
            score: verdict.score,
            text: echo_text(text),
        })
        .collect();

    Ok(Json(BatchResponse {
        total_analyzed: request.texts.len(),
        results,
    }))
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    metrics::counter!("textguard_requests_total", "endpoint" => "stats").increment(1);

    Json(StatsResponse {
        model: state.model_id().to_string(),
        classifier_loaded: state.classifier_loaded(),
        endpoints: Endpoints {
            analyze: "/analyze".to_string(),
            analyze_batch: "/analyze-batch".to_string(),
            health: "/health".to_string(),
        },
    })
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics() {
        Some(handle) => handle.render().into_response(),
        None => fallback().await.into_response(),
    }
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": NOT_FOUND })))
}

fn record_inference(start: Instant, verdicts: &[Verdict]) {
    metrics::histogram!("textguard_inference_latency_us")
        .record(start.elapsed().as_micros() as f64);

    for verdict in verdicts {
        metrics::counter!("textguard_verdicts_total", "label" => verdict.label.as_str())
            .increment(1);
    }
}

/// Strip Unicode whitespace plus the ASCII information separators
/// (U+001C..=U+001F), which clients also treat as blank.
fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c))
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
