//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Insufficient credits: need {required}, have {available}")]
    InsufficientCredits { required: u32, available: u32 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] vlearn_core::CoreError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] vlearn_store::FirestoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] vlearn_queue::QueueError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Firestore(_) | ApiError::Queue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Core(core_err) => core_status_code(core_err),
        }
    }
}

/// Maps the pipeline's error taxonomy (§7) onto HTTP status the way the
/// wire contract in §6 enumerates it per-endpoint: 400 for intake/validation
/// failures, 402 for credit gating, 404 for missing entities, 500 for
/// upstream/dependency trouble.
fn core_status_code(err: &vlearn_core::CoreError) -> StatusCode {
    use vlearn_core::CoreError as E;
    match err {
        E::InvalidUrl(_)
        | E::UnsupportedVideoType(_)
        | E::UnsupportedLanguage(_)
        | E::DurationExceeded { .. }
        | E::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        E::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
        E::NotFound(_) | E::UserNotFound(_) => StatusCode::NOT_FOUND,
        E::MetadataUnavailable(_)
        | E::TranscriptionFailed(_)
        | E::LlmSynthesisFailed(_)
        | E::DependencyFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) | ApiError::Firestore(_) | ApiError::Queue(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse { detail, code: None };

        (status, Json(body)).into_response()
    }
}
