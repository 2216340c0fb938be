//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gantry_storage::EngineError;
use serde::Serialize;

/// Error payload in the shape upload clients expect: a message plus the
/// retry hints. `preventRetry` tells the client to stop resending the same
/// request; `reset` tells it to restart the upload from the first chunk.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "preventRetry")]
    pub prevent_retry: bool,
    pub reset: bool,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<gantry_core::Error> for ApiError {
    fn from(e: gantry_core::Error) -> Self {
        Self::Engine(EngineError::Core(e))
    }
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(e) => match e {
                EngineError::Core(_) => StatusCode::BAD_REQUEST,
                EngineError::NotComplete { .. }
                | EngineError::NothingToAssemble(_)
                | EngineError::SizeMismatch { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the client may retry the same request.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Engine(e) => e.should_retry(),
            Self::BadRequest(_) | Self::Internal(_) => false,
        }
    }

    /// Whether the client should restart the upload from scratch.
    pub fn should_reset(&self) -> bool {
        match self {
            Self::Engine(e) => e.should_reset(),
            Self::BadRequest(_) | Self::Internal(_) => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            prevent_retry: !self.should_retry(),
            reset: self.should_reset(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_allow_retry() {
        let err = ApiError::Engine(EngineError::Store(std::io::Error::other("disk")));
        assert!(!err.should_reset());
        assert!(err.should_retry());
    }

    #[test]
    fn assembly_errors_demand_reset() {
        let err = ApiError::Engine(EngineError::Assemble(std::io::Error::other("disk")));
        assert!(!err.should_retry());
        assert!(err.should_reset());
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err: ApiError = gantry_core::Error::InvalidFileName("..".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.should_retry());
    }
}
