use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::quota;

/// Uniform response envelope shared by every capability endpoint.
/// `success=true` always carries `content`; `success=false` always carries
/// `message`. The absent field is omitted from the JSON entirely.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Envelope {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            message: None,
            content: Some(content.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            content: None,
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{}", quota::LIMIT_EXCEEDED_MESSAGE)]
    QuotaExceeded,

    #[error("{0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every failure is a per-request response in the envelope shape;
        // only a missing or rejected credential changes the status code.
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Validation(msg) => (StatusCode::OK, msg.clone()),
            AppError::Configuration(msg) => {
                tracing::warn!("Configuration error: {msg}");
                (StatusCode::OK, msg.clone())
            }
            AppError::QuotaExceeded => {
                (StatusCode::OK, quota::LIMIT_EXCEEDED_MESSAGE.to_string())
            }
            AppError::Provider(msg) => {
                tracing::warn!("Provider error: {msg}");
                (StatusCode::OK, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (StatusCode::OK, "Failed to save the creation".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::OK, "An internal error occurred".to_string())
            }
        };

        (status, Json(Envelope::failure(message))).into_response()
    }
}
