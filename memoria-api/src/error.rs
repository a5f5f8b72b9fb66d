//! Error types for memoria-api
//!
//! Every failed request answers with a flat `{ "error": message }` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::services::{CatalogError, StorageError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Backing service not configured (503)
    #[error("{0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// Upstream failure reported with its cause (500, `{ error, details }`)
    #[error("{message}: {details}")]
    Upstream { message: String, details: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": msg }))
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
            ApiError::Upstream { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message, "details": details }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.is_input_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidMemoryId(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_errors_split_by_blame() {
        assert!(matches!(
            ApiError::from(PipelineError::MissingFile),
            ApiError::BadRequest(ref m) if m == "No file provided"
        ));
        assert!(matches!(
            ApiError::from(PipelineError::UnsupportedMediaType("text/plain".to_string())),
            ApiError::BadRequest(ref m) if m == "Unsupported media type: text/plain"
        ));
        assert!(matches!(
            ApiError::from(PipelineError::ProcessingFailed("FAILED".to_string())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
            (ApiError::Unavailable("x".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Internal("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_invalid_memory_id_is_bad_request() {
        let err = ApiError::from(StorageError::InvalidMemoryId("a/b".to_string()));
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
