//! HTTP error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

pub const NO_JSON: &str = "No JSON data provided";
pub const NO_TEXT: &str = "No text provided";
pub const NO_TEXTS: &str = "No texts array provided";
pub const INVALID_TEXTS: &str = "Invalid texts array";
pub const NOT_LOADED: &str = "Classifier not loaded";
pub const NOT_FOUND: &str = "Endpoint not found";
pub const INTERNAL: &str = "Internal server error";
pub const TOO_LARGE: &str = "Request body too large";

/// Handler failure, rendered as `{"error": message}`
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input (400)
    BadRequest(String),
    /// Body over the configured limit (413)
    PayloadTooLarge(String),
    /// Classifier not ready (503)
    ServiceUnavailable(String),
    /// Inference or serialization failure (500)
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_loaded() -> Self {
        Self::ServiceUnavailable(NOT_LOADED.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge(_) => "too_large",
            Self::ServiceUnavailable(_) => "unavailable",
            Self::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg)
            | Self::PayloadTooLarge(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

impl From<textguard_core::Error> for AppError {
    fn from(err: textguard_core::Error) -> Self {
        error!(kind = err.kind(), "Error analyzing text: {}", err);
        AppError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge(TOO_LARGE.to_string());
        }
        AppError::BadRequest(NO_JSON.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        metrics::counter!("textguard_errors_total", "kind" => self.kind()).increment(1);

        let status = self.status();
        let body = json!({ "error": self.message() });

        (status, Json(body)).into_response()
    }
}

/// Response for a panic caught by the middleware stack
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    error!("Handler panicked");
    metrics::counter!("textguard_errors_total", "kind" => "panic").increment(1);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": INTERNAL })),
    )
        .into_response()
}
