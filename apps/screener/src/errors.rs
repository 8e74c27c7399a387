use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Another request for the same action has not finished yet.
    #[error("Request already in progress: {0}")]
    Conflict(String),

    /// Capability switched off in configuration.
    #[error("Feature disabled: {0}")]
    Disabled(&'static str),

    /// A backend call failed. Carries the message shown to the user.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps a failed backend call to the user-visible message: the backend's
    /// own `error` string when it sent one, `fallback` otherwise.
    pub fn backend(err: BackendError, fallback: &str) -> Self {
        tracing::error!("Backend call failed: {err}");
        let message = err.user_message().unwrap_or(fallback).to_string();
        AppError::Backend(message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "REQUEST_IN_FLIGHT", msg.clone()),
            AppError::Disabled(feature) => (
                StatusCode::NOT_FOUND,
                "FEATURE_DISABLED",
                format!("{feature} is disabled"),
            ),
            AppError::Backend(msg) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", msg.clone()),
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
