//! Error types for talkd

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use talk_core::TalkError;
use talk_storage::StorageError;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures at the action-dispatch boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// A core operation refused or failed
    #[error(transparent)]
    Talk(#[from] TalkError),

    /// Request parameters could not be read
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// Mutating action sent without a body-carrying method
    #[error("action `{0}` requires POST")]
    MethodNotAllowed(String),
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Talk(err) => {
                let status = match err {
                    TalkError::Authentication(_) => StatusCode::UNAUTHORIZED,
                    TalkError::Authorization(_) => StatusCode::FORBIDDEN,
                    TalkError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    TalkError::Conflict(_) => StatusCode::CONFLICT,
                    TalkError::NotFound(_) => StatusCode::NOT_FOUND,
                    TalkError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code())
            }
            ApiError::Malformed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::UnknownAction(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_ACTION"),
            ApiError::MethodNotAllowed(_) => {
                (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED")
            }
        }
    }
}

/// Failure body: `{success: false, error, code}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::from(TalkError::authentication())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TalkError::Conflict("dup".into()))
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::UnknownAction("fly".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_details_are_not_leaked() {
        let err = ApiError::from(TalkError::Storage(StorageError::Backend(
            "password authentication failed for user talk".into(),
        )));
        assert_eq!(err.to_string(), "storage failure");
        assert_eq!(err.status_and_code().1, "STORAGE_ERROR");
    }
}
