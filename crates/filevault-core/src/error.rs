//! Error types module
//!
//! This module provides the core error types used throughout the filevault
//! engine. All failures surface as variants of the `EngineError` enum, which
//! can represent lookup misses, backend I/O failures, policy rejections, and
//! security violations.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like lookup misses
    Debug,
    /// Warning level - for policy rejections
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their transport characteristics
/// without the engine knowing about any particular HTTP framework.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "PATH_TRAVERSAL")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Write failure: {0}")]
    WriteFailure(String),

    #[error("Payload rejected: {0}")]
    PayloadRejected(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("Path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("Invalid byte range: {0}")]
    InvalidRange(String),

    #[error("Metadata store error: {0}")]
    Metadata(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        EngineError::Internal(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Internal(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
/// client_message stays per-variant for dynamic content.
fn engine_error_static_metadata(err: &EngineError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        EngineError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        EngineError::WriteFailure(_) => (500, "WRITE_FAILURE", true, LogLevel::Error),
        EngineError::PayloadRejected(_) => (400, "PAYLOAD_REJECTED", false, LogLevel::Warn),
        EngineError::UnsupportedMedia(_) => (415, "UNSUPPORTED_MEDIA", false, LogLevel::Debug),
        EngineError::PathTraversal(_) => (400, "PATH_TRAVERSAL", false, LogLevel::Warn),
        EngineError::InvalidRange(_) => (416, "INVALID_RANGE", false, LogLevel::Debug),
        EngineError::Metadata(_) => (500, "METADATA_ERROR", true, LogLevel::Error),
        EngineError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for EngineError {
    fn http_status_code(&self) -> u16 {
        engine_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        engine_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        engine_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        engine_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            EngineError::NotFound(ref msg) => msg.clone(),
            EngineError::WriteFailure(_) => "Failed to store file".to_string(),
            EngineError::PayloadRejected(ref msg) => msg.clone(),
            EngineError::UnsupportedMedia(ref msg) => msg.clone(),
            EngineError::PathTraversal(_) => "Invalid file path".to_string(),
            EngineError::InvalidRange(ref msg) => msg.clone(),
            EngineError::Metadata(_) => "Internal server error".to_string(),
            EngineError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = EngineError::NotFound("file does not exist".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "file does not exist");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_path_traversal_hides_detail() {
        let err = EngineError::PathTraversal("../../etc/passwd".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "PATH_TRAVERSAL");
        // Internal detail (the offending path) must not leak to clients
        assert_eq!(err.client_message(), "Invalid file path");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_write_failure_recoverable() {
        let err = EngineError::WriteFailure("disk full".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_invalid_range() {
        let err = EngineError::InvalidRange("start beyond end of object".to_string());
        assert_eq!(err.http_status_code(), 416);
        assert_eq!(err.error_code(), "INVALID_RANGE");
        assert!(!err.is_recoverable());
    }
}
