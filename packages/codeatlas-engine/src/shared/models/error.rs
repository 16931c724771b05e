//! Engine error taxonomy
//!
//! Per-file parse errors are collected, never fatal. Per-stage errors are
//! recorded and later stages continue best-effort. Nothing in a public API
//! path panics; fallible operations return `Result<T, EngineError>`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("cross-file resolution error: {0}")]
    CrossFile(String),

    #[error("storage error: {0}")]
    Storage(#[from] codeatlas_store::StorageError),

    #[error("index error [{index}]: {message}")]
    Index { index: String, message: String },

    #[error("analysis timed out after {elapsed_ms}ms: {what}")]
    AnalysisTimeout { what: String, elapsed_ms: u64 },

    #[error("degraded result: {0}")]
    Degraded(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invariant violation at {site}: {message}")]
    InvariantViolation { site: String, message: String },
}

impl EngineError {
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn index(index: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Index {
            index: index.into(),
            message: message.into(),
        }
    }

    pub fn invariant(site: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvariantViolation {
            site: site.into(),
            message: message.into(),
        }
    }

    /// Fatal errors abort a pipeline run; everything else degrades
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Config(_) | EngineError::Storage(_))
    }

    /// Abstract kind tag surfaced in API error arrays
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Parse { .. } => ErrorKind::ParseError,
            EngineError::CrossFile(_) => ErrorKind::CrossFileError,
            EngineError::Storage(_) => ErrorKind::StorageError,
            EngineError::Index { .. } => ErrorKind::IndexError,
            EngineError::AnalysisTimeout { .. } => ErrorKind::AnalysisTimeout,
            EngineError::Degraded(_) => ErrorKind::Degraded,
            EngineError::Config(_) => ErrorKind::ConfigError,
            EngineError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }
}

/// Abstract error kinds exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ParseError,
    CrossFileError,
    StorageError,
    IndexError,
    AnalysisTimeout,
    Degraded,
    ConfigError,
    InvariantViolation,
}

/// Wire-shaped error entry: `{kind, where, message}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    #[serde(rename = "where")]
    pub site: String,
    pub message: String,
}

impl ErrorEntry {
    pub fn from_error(site: impl Into<String>, err: &EngineError) -> Self {
        Self {
            kind: err.kind(),
            site: site.into(),
            message: err.to_string(),
        }
    }
}

/// Response status carried by every user-visible surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Degraded,
    Failed,
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_storage_errors_are_fatal() {
        assert!(EngineError::Config("bad worker count".into()).is_fatal());
        assert!(!EngineError::parse("a.py", "unexpected indent").is_fatal());
        assert!(!EngineError::Degraded("partial taint".into()).is_fatal());
    }

    #[test]
    fn error_entry_carries_kind_and_site() {
        let err = EngineError::invariant("chunking", "child span exceeds parent");
        let entry = ErrorEntry::from_error("L2", &err);
        assert_eq!(entry.kind, ErrorKind::InvariantViolation);
        assert_eq!(entry.site, "L2");
    }
}
