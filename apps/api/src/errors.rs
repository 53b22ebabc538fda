use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::chat::session::ChatError;
use crate::llm_client::GatewayError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::UnsupportedFile { .. } => {
                AppError::Validation(err.to_string())
            }
            ChatError::InvalidEditTarget { .. } => {
                tracing::warn!("Rejected edit request: {err}");
                AppError::Validation(err.to_string())
            }
            ChatError::EditInProgress { .. } | ChatError::NotEditing => {
                AppError::Conflict(err.to_string())
            }
            ChatError::NotConfigured => AppError::Config(err.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidConfig(_) => AppError::Validation(err.to_string()),
            GatewayError::Auth(_) | GatewayError::NotConfigured => {
                AppError::Config(err.to_string())
            }
            GatewayError::Transport(_) | GatewayError::Generation(_) => {
                AppError::Llm(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Config(msg) => (
                StatusCode::PRECONDITION_FAILED,
                "CONFIG_ERROR",
                msg.clone(),
            ),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    format!("An AI processing error occurred: {msg}"),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_errors_map_to_statuses() {
        let cases = [
            (ChatError::EmptyMessage, StatusCode::BAD_REQUEST),
            (
                ChatError::UnsupportedFile {
                    name: "a.exe".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ChatError::InvalidEditTarget { index: 3, len: 2 },
                StatusCode::BAD_REQUEST,
            ),
            (ChatError::EditInProgress { index: 0 }, StatusCode::CONFLICT),
            (ChatError::NotEditing, StatusCode::CONFLICT),
            (ChatError::NotConfigured, StatusCode::PRECONDITION_FAILED),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_gateway_errors_map_to_statuses() {
        let cases = [
            (GatewayError::Auth("empty".into()), StatusCode::PRECONDITION_FAILED),
            (GatewayError::InvalidConfig("hot".into()), StatusCode::BAD_REQUEST),
            (GatewayError::Generation("boom".into()), StatusCode::BAD_GATEWAY),
            (GatewayError::Transport("down".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
