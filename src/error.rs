use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Screenshot capture failed: {0}")]
    Screenshot(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    ValidationError(String),

    #[error("No active recording")]
    NotRecording,
}

impl From<rusqlite::Error> for RecorderError {
    fn from(e: rusqlite::Error) -> Self {
        RecorderError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RecorderError {
    fn from(e: serde_json::Error) -> Self {
        RecorderError::Encoding(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

impl IntoResponse for RecorderError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            RecorderError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            RecorderError::NotRecording => (StatusCode::CONFLICT, "Conflict"),
            RecorderError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage Error"),
            RecorderError::Screenshot(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Screenshot Error"),
            RecorderError::Encoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Encoding Error"),
            RecorderError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Config Error"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
