//! Filevault Core Library
//!
//! This crate provides the domain models, error types, configuration access,
//! content digests, and payload encryption shared by all filevault components.

pub mod audit;
pub mod config;
pub mod digest;
pub mod encryption;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use audit::{AuditLog, NoOpAuditLog};
pub use config::{ConfigStore, EnvConfigStore, MemoryConfigStore, Settings};
pub use digest::ContentDigests;
pub use encryption::EncryptionService;
pub use error::{EngineError, EngineResult, ErrorMetadata, LogLevel};
pub use models::{NewStoredFile, ScanStatus, StorageBackendId, StoredFile};
