//! Error handling module.
//!
//! `SequenceError` is the whole error surface of the sequence service: callers
//! either passed a bad key or the store could not commit. Storage backends
//! report `StorageError`, which the service wraps into
//! `SequenceError::StoreUnavailable`.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deadpool_redis::redis::RedisError;
use serde_json::json;

pub use codes::ErrorCode;

/// Error returned by the sequence service.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// Malformed or empty tenant/class input.
    #[error("Invalid counter key: {0}")]
    InvalidKey(String),

    /// The store could not complete the atomic increment. No number was
    /// consumed unless the store committed before the failure was observed.
    #[error("Sequence store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
}

impl SequenceError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidKey(_) => ErrorCode::INVALID_KEY,
            Self::StoreUnavailable(_) => ErrorCode::STORE_UNAVAILABLE,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidKey(_) => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "invalid_key",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl IntoResponse for SequenceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().as_i32();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error_code = code, status = %status, message = %message, "Request failed");
        } else {
            tracing::warn!(error_code = code, status = %status, message = %message, "Request rejected");
        }

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": null
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query failed: {0}")]
    Query(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Store round-trip exceeded its deadline.
    #[error("Store operation timed out after {0} ms")]
    Timeout(u64),

    /// Store refused the operation.
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl StorageError {
    /// Deadline error for an operation bounded by `timeout`.
    #[must_use]
    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<RedisError> for StorageError {
    fn from(err: RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
            Self::Connection(err.to_string())
        } else {
            Self::Query(err.to_string())
        }
    }
}

impl From<deadpool_redis::PoolError> for StorageError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Connection(err.to_string())
            }
            _ => Self::Query(err.to_string()),
        }
    }
}

/// Result type alias using `SequenceError`.
pub type Result<T> = std::result::Result<T, SequenceError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SequenceError::InvalidKey("test".to_string()).error_code(),
            ErrorCode::INVALID_KEY
        );
        assert_eq!(
            SequenceError::StoreUnavailable(StorageError::Unavailable).error_code(),
            ErrorCode::STORE_UNAVAILABLE
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SequenceError::InvalidKey("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SequenceError::from(StorageError::Timeout(50)).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_storage_error_wrapping() {
        let err = SequenceError::from(StorageError::from(std::io::Error::other("disk gone")));
        assert!(matches!(
            err,
            SequenceError::StoreUnavailable(StorageError::FileIO(_))
        ));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_sqlx_pool_timeout_is_connection_error() {
        assert!(matches!(
            StorageError::from(sqlx::Error::PoolTimedOut),
            StorageError::Connection(_)
        ));
        assert!(matches!(
            StorageError::from(sqlx::Error::RowNotFound),
            StorageError::Query(_)
        ));
    }
}
