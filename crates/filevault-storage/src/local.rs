use crate::keys;
use crate::traits::{ByteRange, Retrieved, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackendId;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/filevault/files")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a relative path to a filesystem path with security validation.
    ///
    /// The path must not escape the base storage directory. This check runs
    /// on every call, before any filesystem access.
    fn key_to_path(&self, relative_path: &str) -> StorageResult<PathBuf> {
        if relative_path.is_empty()
            || relative_path.starts_with('/')
            || relative_path.split('/').any(|seg| seg == "..")
        {
            return Err(StorageError::InvalidKey(
                "Storage path contains invalid segments".to_string(),
            ));
        }

        let path = self.base_path.join(relative_path);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // An existing path must canonicalize under the root; a not-yet-created
        // one already passed the segment check above.
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage path resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.ensure_parent_dir(path).await?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(
        &self,
        data: Vec<u8>,
        original_name: &str,
        content_type: &str,
        folder_hint: &str,
    ) -> StorageResult<StoredObject> {
        let generated_name = keys::generated_name(original_name);
        let folder = folder_hint.trim_matches('/');
        let relative_path = if folder.is_empty() {
            generated_name.clone()
        } else {
            format!("{}/{}", folder, generated_name)
        };
        let path = self.key_to_path(&relative_path)?;
        let size = data.len();

        let start = std::time::Instant::now();

        self.write_file(&path, &data).await?;

        tracing::info!(
            path = %path.display(),
            key = %relative_path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage store successful"
        );

        Ok(StoredObject {
            generated_name,
            relative_path,
            size_bytes: size as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn store_at(&self, relative_path: &str, data: Vec<u8>) -> StorageResult<()> {
        let path = self.key_to_path(relative_path)?;
        let size = data.len();

        let start = std::time::Instant::now();

        self.write_file(&path, &data).await?;

        tracing::info!(
            path = %path.display(),
            key = %relative_path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage store_at successful"
        );

        Ok(())
    }

    async fn retrieve(
        &self,
        relative_path: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<Retrieved> {
        let path = self.key_to_path(relative_path)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(relative_path.to_string()));
        }

        let mut file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let total_size = file
            .metadata()
            .await
            .map_err(|e| StorageError::ReadFailed(format!("Failed to stat file: {}", e)))?
            .len();

        let reader: Box<dyn tokio::io::AsyncRead + Send + Unpin> = match range {
            Some(range) => {
                if range.start > range.end || range.end >= total_size {
                    return Err(StorageError::InvalidRange(format!(
                        "Range {}-{} outside object of {} bytes",
                        range.start, range.end, total_size
                    )));
                }

                file.seek(SeekFrom::Start(range.start)).await.map_err(|e| {
                    StorageError::ReadFailed(format!("Failed to seek to {}: {}", range.start, e))
                })?;

                Box::new(file.take(range.length()))
            }
            None => Box::new(file),
        };

        let stream = tokio_util::io::ReaderStream::new(reader).map(|result| {
            result.map_err(|e| StorageError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Retrieved {
            stream: Box::pin(stream),
            total_size,
        })
    }

    async fn content_length(&self, relative_path: &str) -> StorageResult<u64> {
        let path = self.key_to_path(relative_path)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(relative_path.to_string()));
        }

        let meta = fs::metadata(&path)
            .await
            .map_err(|e| StorageError::ReadFailed(format!("Failed to stat file: {}", e)))?;

        Ok(meta.len())
    }

    async fn delete(&self, relative_path: &str) -> StorageResult<()> {
        let path = self.key_to_path(relative_path)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %relative_path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, relative_path: &str) -> bool {
        match self.key_to_path(relative_path) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    fn backend_id(&self) -> StorageBackendId {
        StorageBackendId::Local
    }
}
