pub mod file;

pub use file::{NewStoredFile, ScanStatus, StorageBackendId, StoredFile};
