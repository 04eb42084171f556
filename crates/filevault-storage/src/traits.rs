//! Storage abstraction trait
//!
//! This module defines the `Storage` trait that all storage backends must
//! implement. The engine composes against this trait only and never branches
//! on backend type.

use crate::StorageBackendId;
use async_trait::async_trait;
use bytes::Bytes;
use filevault_core::EngineError;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidKey(String),

    #[error("Invalid byte range: {0}")]
    InvalidRange(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => EngineError::NotFound(msg),
            StorageError::InvalidKey(msg) => EngineError::PathTraversal(msg),
            StorageError::InvalidRange(msg) => EngineError::InvalidRange(msg),
            StorageError::WriteFailed(msg) => EngineError::WriteFailure(msg),
            StorageError::ReadFailed(msg) | StorageError::DeleteFailed(msg) => {
                EngineError::Internal(msg)
            }
            StorageError::IoError(e) => EngineError::Internal(format!("IO error: {}", e)),
            StorageError::ConfigError(msg) => EngineError::Internal(msg),
        }
    }
}

/// A boxed stream of byte chunks, the currency of the download path.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Inclusive byte range `[start, end]` of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of bytes the range covers.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Result of a successful `store` call.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub generated_name: String,
    pub relative_path: String,
    pub size_bytes: u64,
    pub content_type: String,
}

/// A retrieved object: its byte stream (full or range-limited) and the
/// total size of the underlying object.
pub struct Retrieved {
    pub stream: ByteStream,
    pub total_size: u64,
}

/// Storage capability trait
///
/// All backends (local filesystem today; object stores later) implement this
/// identically so the orchestrator never branches on backend type. New
/// backends slot in as new implementations plus a resolver entry.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a payload under a freshly generated collision-free name inside
    /// `folder_hint`, creating any intermediate directories.
    ///
    /// A failed store never reports success; partial writes surface as
    /// `WriteFailed`.
    async fn store(
        &self,
        data: Vec<u8>,
        original_name: &str,
        content_type: &str,
        folder_hint: &str,
    ) -> StorageResult<StoredObject>;

    /// Store raw bytes at a caller-chosen relative path (the caller has
    /// already derived the locator).
    async fn store_at(&self, relative_path: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Retrieve an object, optionally limited to an inclusive byte range.
    ///
    /// Fails with `NotFound` when the path does not resolve, and with
    /// `InvalidRange` when the range lies outside the object.
    async fn retrieve(
        &self,
        relative_path: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<Retrieved>;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, relative_path: &str) -> StorageResult<u64>;

    /// Delete an object. Idempotent: deleting a missing path succeeds.
    async fn delete(&self, relative_path: &str) -> StorageResult<()>;

    /// Check whether an object exists. Never errors; I/O failures read as
    /// absent.
    async fn exists(&self, relative_path: &str) -> bool;

    /// The backend's identifier, as recorded in file metadata.
    fn backend_id(&self) -> StorageBackendId;
}
