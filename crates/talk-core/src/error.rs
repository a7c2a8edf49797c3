use talk_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type TalkResult<T> = Result<T, TalkError>;

/// Failure taxonomy surfaced at the action boundary.
#[derive(Debug, Error)]
pub enum TalkError {
    #[error("authentication required: {0}")]
    Authentication(String),

    #[error("not permitted: {0}")]
    Authorization(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage failure")]
    Storage(#[source] StorageError),
}

impl TalkError {
    /// Stable coarse code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            TalkError::Authentication(_) => "AUTHENTICATION_REQUIRED",
            TalkError::Authorization(_) => "FORBIDDEN",
            TalkError::Validation(_) => "VALIDATION_ERROR",
            TalkError::Conflict(_) => "CONFLICT",
            TalkError::NotFound(_) => "NOT_FOUND",
            TalkError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn authentication() -> Self {
        TalkError::Authentication("no user identity on this request".into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        TalkError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        TalkError::NotFound(msg.into())
    }
}

impl From<StorageError> for TalkError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => TalkError::NotFound(msg),
            StorageError::Conflict(msg) | StorageError::InvariantViolation(msg) => {
                TalkError::Conflict(msg)
            }
            StorageError::InvalidInput(msg) => TalkError::Validation(msg),
            other => {
                tracing::error!(error = %other, "storage operation failed");
                TalkError::Storage(other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_onto_taxonomy() {
        let err: TalkError = StorageError::InvariantViolation("last facilitator".into()).into();
        assert_eq!(err.code(), "CONFLICT");

        let err: TalkError = StorageError::InvalidInput("self link".into()).into();
        assert!(matches!(err, TalkError::Validation(_)));

        let err: TalkError = StorageError::Backend("connection reset".into()).into();
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert_eq!(err.to_string(), "storage failure");
    }
}
