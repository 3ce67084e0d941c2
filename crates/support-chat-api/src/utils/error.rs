use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Shown to callers for any failure that is not their fault.
pub const TECHNICAL_DIFFICULTIES_MESSAGE: &str =
    "We're experiencing technical difficulties. Please try again in a moment or contact our support team.";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Rate limit exceeded, retry in {reset_in_seconds}s")]
    RateLimited { reset_in_seconds: u64 },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ChatError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Offending field for validation failures
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ChatError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_in: Option<u64>,
    timestamp: DateTime<Utc>,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, error_type, message, field, reset_in) = match self {
            ChatError::Validation { field, message } => {
                tracing::warn!("Validation error on {}: {}", field, message);
                (StatusCode::BAD_REQUEST, "ValidationError", message, Some(field), None)
            }
            ChatError::RateLimited { reset_in_seconds } => {
                tracing::warn!("Rate limited, reset in {}s", reset_in_seconds);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RateLimitExceeded",
                    format!(
                        "Too many requests. Please try again in {} seconds.",
                        reset_in_seconds
                    ),
                    None,
                    Some(reset_in_seconds),
                )
            }
            ChatError::Store(msg) => {
                tracing::error!("Store error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    TECHNICAL_DIFFICULTIES_MESSAGE.to_string(),
                    None,
                    None,
                )
            }
            ChatError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    TECHNICAL_DIFFICULTIES_MESSAGE.to_string(),
                    None,
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_type,
            message,
            field,
            reset_in,
            timestamp: Utc::now(),
        });

        (status, body).into_response()
    }
}
