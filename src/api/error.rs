use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            ApiError::StorageError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::UpstreamError(_) => "UpstreamError",
            ApiError::StorageError(_) => "StorageError",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match &self {
            ApiError::StorageError(_) | ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            ApiError::UpstreamError(_) => {
                tracing::warn!(error = %self, "upstream unavailable");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<CacheError> for ApiError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::InvalidRange { .. } => ApiError::BadRequest(error.to_string()),
            CacheError::Upstream(e) => ApiError::UpstreamError(e.to_string()),
            CacheError::Storage(e) => ApiError::StorageError(e.to_string()),
            CacheError::UnknownStore(_) => ApiError::InternalError(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GridTimestamp;
    use crate::upstream::UpstreamError;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UpstreamError("test".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::StorageError("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cache_error_mapping() {
        let t = GridTimestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let invalid: ApiError = CacheError::InvalidRange { from: t, to: t }.into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let upstream: ApiError = CacheError::Upstream(UpstreamError::Transient("timeout".into())).into();
        assert_eq!(upstream.error_type(), "UpstreamError");
    }

    #[test]
    fn test_error_display() {
        let error = ApiError::NotFound("production type 'coal'".to_string());
        assert_eq!(error.to_string(), "Resource not found: production type 'coal'");
    }
}
