use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use ex314_persist::PersistError;

/// Replacement notice when the reply never started
pub const UNAVAILABLE_NOTICE: &str = "Sorry, the AI response could not be retrieved.";

/// Replacement notice when the reply broke off mid-stream
pub const INTERRUPTED_NOTICE: &str = "The AI response was interrupted. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error")]
    Upstream,

    #[error("LLM error: {0}")]
    Llm(#[from] ex314_llm::LlmError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Context error: {0}")]
    Context(#[from] anyhow::Error),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ThreadNotFound(_) | ApiError::NotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Upstream => (StatusCode::BAD_GATEWAY, self.to_string()),
            ApiError::Llm(ref e) => {
                tracing::error!("LLM error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, UNAVAILABLE_NOTICE.to_string())
            }
            ApiError::Persist(PersistError::ThreadNotFound(ref id)) => {
                (StatusCode::NOT_FOUND, format!("Thread not found: {}", id))
            }
            ApiError::Persist(ref e @ (PersistError::DuplicateMessage { .. } | PersistError::InvalidId(_))) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Context(ref e) => {
                tracing::error!("Context error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Processing error".to_string())
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
