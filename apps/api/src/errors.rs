use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::docx::DocxError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The upload is not a document we can work with (wrong format, corrupt package).
    /// Reported separately from `Internal` so clients can tell "wrong file" from "our fault".
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DocxError> for AppError {
    fn from(err: DocxError) -> Self {
        match err {
            DocxError::Io(e) => AppError::Internal(anyhow::Error::new(e)),
            DocxError::SameInputAndOutput(path) => AppError::Internal(anyhow::anyhow!(
                "refusing to overwrite template at {}",
                path.display()
            )),
            other => AppError::InvalidDocument(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidDocument(msg) => {
                tracing::warn!("Rejected upload: {msg}");
                (
                    StatusCode::BAD_REQUEST,
                    "INVALID_DOCUMENT",
                    format!("The uploaded document could not be processed: {msg}"),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
