//! Filevault Engine Library
//!
//! This crate is the orchestration layer: it composes the storage backends,
//! the byte-rate throttle, and the crypto/digest routines from core into the
//! public upload/download/thumbnail/cleanup operations. The metadata store,
//! configuration store, and audit trail are injected collaborators.

pub mod cleanup;
pub mod engine;
pub mod metadata;
pub mod throttle;

// Re-export commonly used types
pub use cleanup::CleanupService;
pub use engine::{FileDownload, RangeRequest, StorageEngine, UploadRequest};
pub use filevault_core::{
    AuditLog, ConfigStore, EngineError, EngineResult, NewStoredFile, NoOpAuditLog, ScanStatus,
    Settings, StorageBackendId, StoredFile,
};
pub use filevault_processing::{Thumbnail, Thumbnailer};
pub use filevault_storage::{
    create_storage, BackendResolver, ByteRange, ByteStream, LocalStorage, Storage, StorageError,
};
pub use metadata::FileMetadataStore;
pub use throttle::ThrottledStream;
