//! Configuration module
//!
//! The platform keeps storage tunables in a dynamic configuration store with
//! an audit trail of changes. The engine never reads that store directly;
//! it goes through the `ConfigStore` trait so behavior is fully determined by
//! explicit inputs and trivially testable with fakes.
//!
//! `Settings` wraps a store with typed accessors and defaults. Values are
//! read on every call - the store is dynamic and the engine must observe
//! changes without a restart.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::StorageBackendId;

pub const MAX_UPLOAD_SIZE_BYTES: &str = "MAX_UPLOAD_SIZE_BYTES";
pub const ALLOWED_CONTENT_TYPES: &str = "ALLOWED_CONTENT_TYPES";
pub const STORAGE_BACKEND: &str = "STORAGE_BACKEND";
pub const LOCAL_STORAGE_PATH: &str = "LOCAL_STORAGE_PATH";
pub const TEMP_FILE_TTL_HOURS: &str = "TEMP_FILE_TTL_HOURS";
pub const ENCRYPTION_ENABLED: &str = "ENCRYPTION_ENABLED";
pub const ENCRYPTION_CONTENT_TYPES: &str = "ENCRYPTION_CONTENT_TYPES";
pub const ENCRYPTION_KEY: &str = "ENCRYPTION_KEY";
pub const DOWNLOAD_THROTTLE_BYTES_PER_SEC: &str = "DOWNLOAD_THROTTLE_BYTES_PER_SEC";
pub const THUMBNAIL_QUALITY: &str = "THUMBNAIL_QUALITY";

const DEFAULT_MAX_UPLOAD_SIZE_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_TEMP_FILE_TTL_HOURS: i64 = 24;
const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

/// Key/value view over the platform's dynamic configuration store.
pub trait ConfigStore: Send + Sync {
    /// Fetch the raw value for a key, if set.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads configuration from process environment variables.
pub struct EnvConfigStore;

impl ConfigStore for EnvConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// In-memory configuration, for tests and embedded use.
#[derive(Default)]
pub struct MemoryConfigStore {
    values: HashMap<String, String>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Typed accessors with defaults over a `ConfigStore`.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn ConfigStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.store
            .get(key)
            .and_then(|raw| raw.trim().parse::<T>().ok())
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.store
            .get(key)
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.parsed(MAX_UPLOAD_SIZE_BYTES)
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_BYTES)
    }

    /// Accepted MIME patterns for uploads. Empty means all types allowed.
    pub fn allowed_content_types(&self) -> Vec<String> {
        self.list(ALLOWED_CONTENT_TYPES)
    }

    /// The backend new uploads are written to.
    pub fn storage_backend(&self) -> StorageBackendId {
        self.parsed(STORAGE_BACKEND).unwrap_or(StorageBackendId::Local)
    }

    /// Root directory for the local backend.
    pub fn local_storage_path(&self) -> Option<String> {
        self.store.get(LOCAL_STORAGE_PATH)
    }

    /// Lifetime of temporary files, in hours.
    pub fn temp_file_ttl_hours(&self) -> i64 {
        self.parsed(TEMP_FILE_TTL_HOURS)
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_TEMP_FILE_TTL_HOURS)
    }

    /// Whether at-rest encryption is enabled globally.
    pub fn encryption_enabled(&self) -> bool {
        self.parsed(ENCRYPTION_ENABLED).unwrap_or(false)
    }

    /// MIME patterns encryption applies to. Empty means every upload.
    pub fn encryption_content_types(&self) -> Vec<String> {
        self.list(ENCRYPTION_CONTENT_TYPES)
    }

    /// Server-held encryption secret (base64, 32 bytes decoded).
    pub fn encryption_key(&self) -> Option<String> {
        self.store.get(ENCRYPTION_KEY).filter(|k| !k.is_empty())
    }

    /// Default download throttle in bytes/second. 0 disables throttling.
    pub fn download_throttle_bytes_per_sec(&self) -> u64 {
        self.parsed(DOWNLOAD_THROTTLE_BYTES_PER_SEC).unwrap_or(0)
    }

    /// WebP quality for derived thumbnails, clamped to 1-100.
    pub fn thumbnail_quality(&self) -> u8 {
        self.parsed::<u8>(THUMBNAIL_QUALITY)
            .unwrap_or(DEFAULT_THUMBNAIL_QUALITY)
            .clamp(1, 100)
    }
}
