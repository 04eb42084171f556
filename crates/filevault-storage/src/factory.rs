use crate::{LocalStorage, Storage, StorageBackendId, StorageError, StorageResult};
use filevault_core::Settings;
use std::collections::HashMap;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(settings: &Settings) -> StorageResult<Arc<dyn Storage>> {
    match settings.storage_backend() {
        StorageBackendId::Local => {
            let base_path = settings.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }
    }
}

/// Lookup table from backend id to backend instance.
///
/// Files record the backend that owns them; the engine resolves each file's
/// backend here. This is the single indirection point for additional
/// backends: implement `Storage`, register it, done - no caller changes.
#[derive(Default)]
pub struct BackendResolver {
    backends: HashMap<StorageBackendId, Arc<dyn Storage>>,
}

impl BackendResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn Storage>) {
        self.backends.insert(backend.backend_id(), backend);
    }

    pub fn resolve(&self, id: StorageBackendId) -> StorageResult<Arc<dyn Storage>> {
        self.backends.get(&id).cloned().ok_or_else(|| {
            StorageError::ConfigError(format!("Storage backend not registered: {}", id))
        })
    }
}
