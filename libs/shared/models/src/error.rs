use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0:?}")]
    Validation(Vec<String>),

    #[error("AI provider rate limit reached")]
    RateLimited,

    #[error("AI service error: {0}")]
    AiService(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 4xx messages go back to the caller; 5xx detail stays in the logs
        // and a fixed safe message goes out instead.
        let (status, message): (StatusCode, Value) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, json!(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!(msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!(msg)),
            AppError::Validation(msgs) => (StatusCode::BAD_REQUEST, json!(msgs)),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!("API request limit reached. Please wait a moment and try again."),
            ),
            AppError::AiService(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!("An unexpected error occurred with the AI service."),
            ),
            AppError::Extraction(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!("Could not process the document."),
            ),
            AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!("An unexpected internal error occurred."),
            ),
        };

        tracing::error!("Error: {}: {}", status, self);

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": message
        }));

        (status, body).into_response()
    }
}
