//! Storage error taxonomy
//!
//! Every adapter maps its backend failures into `StorageError`; callers never
//! see a backend-specific error type or a panic.

use thiserror::Error;

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found (repository, snapshot, chunk)
    #[error("not found: {0}")]
    NotFound(String),

    /// Foreign-key or schema constraint violated
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Backend connection / IO failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization of attrs / metadata failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input (empty id, malformed snapshot ref)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StorageError::NotFound("row".into()),
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::ConstraintViolation(msg.unwrap_or_else(|| e.to_string()))
            }
            other => StorageError::Backend(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound("row".into()),
            sqlx::Error::Database(e) if e.is_foreign_key_violation() || e.is_unique_violation() => {
                StorageError::ConstraintViolation(e.to_string())
            }
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// Result alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
