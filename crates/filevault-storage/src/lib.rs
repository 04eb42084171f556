//! Filevault Storage Library
//!
//! This crate provides the storage backend abstraction and the local
//! filesystem implementation.
//!
//! # Relative paths
//!
//! Backends address objects by relative path. All backends use the same
//! layout for consistency:
//!
//! - **Temporary files**: `temp/{generated_name}`
//! - **Permanent files**: `{category}/{yyyy}/{mm}/{dd}/{generated_name}`
//!
//! where `category` is the sanitized top-level MIME type. Paths must not
//! contain `..` or a leading `/`. Path derivation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, BackendResolver};
pub use filevault_core::StorageBackendId;
pub use local::LocalStorage;
pub use traits::{ByteRange, ByteStream, Retrieved, Storage, StorageError, StorageResult, StoredObject};
