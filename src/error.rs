//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` enum for all error conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP responses
//! with JSON error bodies.
//!
//! Error mappings:
//! - `RepoNotFound`, `DocumentNotOpen` → 404
//! - `InvalidPath`, `InvalidRange` → 400

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Document not open: {0}")]
    DocumentNotOpen(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

/// Failures from the external attribution provider. These never surface as
/// HTTP errors: a failed fetch resolves as "no attribution" and the caller
/// may retry on a later event. The typed variants exist so the process
/// boundary can log what actually went wrong.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider process could not run: {0}")]
    Process(#[from] std::io::Error),

    #[error("provider exited with status {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("provider output malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::RepoNotFound(path) => {
                (StatusCode::NOT_FOUND, format!("Repository not found: {}", path))
            }
            AppError::DocumentNotOpen(doc) => {
                (StatusCode::NOT_FOUND, format!("Document not open: {}", doc))
            }
            AppError::InvalidPath(path) => {
                (StatusCode::BAD_REQUEST, format!("Invalid path: {}", path))
            }
            AppError::InvalidRange(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid range: {}", msg))
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
