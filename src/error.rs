use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("Failed to read request body: {0}")]
    BodyRead(#[from] axum::Error),

    #[error("Upstream request failed: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),
}

impl AppError {
    fn summary(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "Proxy is misconfigured",
            AppError::MalformedBody(_) => "Invalid JSON in request body",
            AppError::BodyRead(_) => "Failed to read request body",
            AppError::UpstreamUnavailable(_) => "Failed to reach upstream",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = match &self {
            AppError::Configuration(msg) => msg.clone(),
            AppError::MalformedBody(e) => e.to_string(),
            AppError::BodyRead(e) => e.to_string(),
            AppError::UpstreamUnavailable(e) => e.to_string(),
        };

        let body = Json(json!({
            "error": self.summary(),
            "details": details,
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
