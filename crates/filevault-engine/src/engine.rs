//! Storage engine orchestrator
//!
//! The only component with business rules: encryption policy, path
//! derivation, TTL policy. Backends, the metadata store, configuration, and
//! the audit trail are all injected; behavior is fully determined by
//! explicit inputs.

use bytes::Bytes;
use chrono::{Duration, Utc};
use futures::StreamExt;
use std::sync::Arc;
use uuid::Uuid;

use filevault_core::{
    validation, AuditLog, ContentDigests, EncryptionService, EngineError, EngineResult,
    NewStoredFile, ScanStatus, Settings, StoredFile,
};
use filevault_processing::Thumbnailer;
use filevault_storage::{keys, BackendResolver, ByteRange, ByteStream, Storage, StorageError};

pub use filevault_processing::Thumbnail;

/// Upload parameters.
#[derive(Debug)]
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub original_name: String,
    pub content_type: String,
    pub owner_id: Option<Uuid>,
    pub temporary: bool,
}

/// A client byte-range request: `end` absent means "to the end of the
/// object", per the conventional inclusive `start-end` semantics.
#[derive(Debug, Clone, Copy)]
pub struct RangeRequest {
    pub start: u64,
    pub end: Option<u64>,
}

/// A resolved download: the (possibly range-limited, possibly throttled)
/// byte stream plus the metadata transport layers need for headers. The
/// plaintext digests ride along so callers can set integrity headers even
/// when storage is internally encrypted.
pub struct FileDownload {
    pub stream: ByteStream,
    /// Size of the full served representation (plaintext size for encrypted
    /// files).
    pub total_size: u64,
    /// Bytes this stream will actually produce.
    pub content_length: u64,
    /// The resolved range, when the request was partial.
    pub range: Option<ByteRange>,
    pub content_type: String,
    pub filename: String,
    pub checksum_md5: String,
    pub checksum_sha256: String,
}

pub struct StorageEngine {
    resolver: Arc<BackendResolver>,
    metadata: Arc<dyn crate::FileMetadataStore>,
    settings: Settings,
    audit: Arc<dyn AuditLog>,
}

impl StorageEngine {
    pub fn new(
        resolver: Arc<BackendResolver>,
        metadata: Arc<dyn crate::FileMetadataStore>,
        settings: Settings,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            resolver,
            metadata,
            settings,
            audit,
        }
    }

    /// Store an uploaded payload and persist its metadata record.
    ///
    /// Plaintext digests are computed before any transformation; encryption,
    /// when policy selects it, replaces the stored bytes with ciphertext and
    /// records the fresh IV in metadata. `size_bytes` reflects the stored
    /// payload.
    #[tracing::instrument(skip(self, request), fields(name = %request.original_name, size = request.data.len()))]
    pub async fn upload(&self, request: UploadRequest) -> EngineResult<StoredFile> {
        let UploadRequest {
            data,
            original_name,
            content_type,
            owner_id,
            temporary,
        } = request;

        let max_size = self.settings.max_upload_size_bytes();
        if data.len() as u64 > max_size {
            return Err(EngineError::PayloadRejected(format!(
                "File of {} bytes exceeds the {} byte limit",
                data.len(),
                max_size
            )));
        }

        let allowed = self.settings.allowed_content_types();
        if !validation::mime_matches_any(&allowed, &content_type) {
            return Err(EngineError::PayloadRejected(format!(
                "Content type not allowed: {}",
                content_type
            )));
        }

        // Digests always describe the plaintext, whatever gets stored.
        let digests = ContentDigests::compute(&data);

        let now = Utc::now();
        let folder_hint = keys::storage_prefix(&content_type, temporary, now);
        let expires_at =
            temporary.then(|| now + Duration::hours(self.settings.temp_file_ttl_hours()));

        let (payload, encryption_iv) = if self.encryption_applies(&content_type) {
            let service = self.encryption_service_required()?;
            let (ciphertext, iv) = service.encrypt_detached(&data)?;
            (ciphertext, Some(iv))
        } else {
            (data, None)
        };
        let is_encrypted = encryption_iv.is_some();

        let backend = self.resolver.resolve(self.settings.storage_backend())?;
        let stored = backend
            .store(payload, &original_name, &content_type, &folder_hint)
            .await?;

        let record = NewStoredFile {
            original_name: original_name.clone(),
            generated_name: stored.generated_name,
            content_type: content_type.clone(),
            size_bytes: stored.size_bytes as i64,
            relative_path: stored.relative_path,
            backend_id: backend.backend_id(),
            owner_id,
            is_temporary: temporary,
            expires_at,
            checksum_md5: digests.md5,
            checksum_sha256: digests.sha256,
            is_encrypted,
            encryption_iv,
            scan_status: ScanStatus::default(),
        };

        let file = self
            .metadata
            .create(record)
            .await
            .map_err(|e| EngineError::Metadata(e.to_string()))?;

        tracing::info!(
            file_id = %file.id,
            key = %file.relative_path,
            size_bytes = file.size_bytes,
            encrypted = file.is_encrypted,
            temporary = file.is_temporary,
            "File upload successful"
        );

        self.audit_event(
            "file.upload",
            owner_id,
            serde_json::json!({
                "file_id": file.id,
                "original_name": original_name,
                "content_type": content_type,
                "size_bytes": file.size_bytes,
                "encrypted": file.is_encrypted,
                "temporary": file.is_temporary,
            }),
        )
        .await;

        Ok(file)
    }

    /// Open a download stream, optionally limited to a byte range and
    /// throttled to the configured default rate.
    ///
    /// Encrypted files are decrypted before range slicing, so callers always
    /// receive plaintext bytes; `total_size` is the plaintext length.
    pub async fn get_stream(
        &self,
        id: Uuid,
        range: Option<RangeRequest>,
    ) -> EngineResult<FileDownload> {
        let file = self.find_file(id).await?;

        let (stream, total_size, resolved_range) = if file.is_encrypted {
            self.decrypted_stream(&file, range).await?
        } else {
            let backend = self.resolver.resolve(file.backend_id)?;
            let total_size = backend.content_length(&file.relative_path).await?;
            let resolved = resolve_range(range, total_size)?;
            let retrieved = backend.retrieve(&file.relative_path, resolved).await?;
            (retrieved.stream, total_size, resolved)
        };

        let content_length = resolved_range.map(|r| r.length()).unwrap_or(total_size);

        let throttle = self.settings.download_throttle_bytes_per_sec();
        let stream: ByteStream = if throttle > 0 {
            Box::pin(crate::ThrottledStream::new(stream, throttle))
        } else {
            stream
        };

        Ok(FileDownload {
            stream,
            total_size,
            content_length,
            range: resolved_range,
            content_type: file.content_type,
            filename: file.original_name,
            checksum_md5: file.checksum_md5,
            checksum_sha256: file.checksum_sha256,
        })
    }

    /// Derive a thumbnail for an image file. Always regenerated on request;
    /// nothing is persisted.
    pub async fn generate_thumbnail(
        &self,
        id: Uuid,
        width: u32,
        height: Option<u32>,
    ) -> EngineResult<Thumbnail> {
        let file = self.find_file(id).await?;

        if !validation::mime_matches("image/*", &file.content_type) {
            return Err(EngineError::UnsupportedMedia(format!(
                "Cannot thumbnail content type: {}",
                file.content_type
            )));
        }

        // Thumbnailing needs the full decoded image
        let plaintext = self.load_plaintext(&file).await?;

        Thumbnailer::generate(&plaintext, width, height, self.settings.thumbnail_quality())
            .map_err(|e| EngineError::UnsupportedMedia(format!("Failed to process image: {}", e)))
    }

    /// Delete a file from its backend and remove its metadata record.
    ///
    /// Not synchronized against in-flight readers of the same id: streams
    /// already open against a local file handle finish safely on POSIX, but
    /// backends resolving paths lazily would not give that guarantee.
    pub async fn delete(&self, id: Uuid) -> EngineResult<()> {
        let file = self.find_file(id).await?;
        let backend = self.resolver.resolve(file.backend_id)?;

        backend.delete(&file.relative_path).await?;

        self.metadata
            .delete(file.id)
            .await
            .map_err(|e| EngineError::Metadata(e.to_string()))?;

        tracing::info!(file_id = %file.id, key = %file.relative_path, "File deleted");

        self.audit_event(
            "file.delete",
            None,
            serde_json::json!({
                "file_id": file.id,
                "original_name": file.original_name,
            }),
        )
        .await;

        Ok(())
    }

    /// Remove expired temporary files. Per-file failures are logged and the
    /// sweep continues; anything left behind is retried on the next run
    /// because its metadata still matches the expiry query.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_temp_files(&self) -> EngineResult<usize> {
        let expired = self
            .metadata
            .find_expired_temporary(Utc::now())
            .await
            .map_err(|e| EngineError::Metadata(e.to_string()))?;

        let mut removed = 0usize;

        for file in expired {
            tracing::info!(
                file_id = %file.id,
                key = %file.relative_path,
                expires_at = ?file.expires_at,
                "Deleting expired temporary file"
            );

            let backend = match self.resolver.resolve(file.backend_id) {
                Ok(backend) => backend,
                Err(e) => {
                    tracing::error!(error = %e, file_id = %file.id, "Failed to resolve backend, skipping");
                    continue;
                }
            };

            if let Err(e) = backend.delete(&file.relative_path).await {
                tracing::error!(
                    error = %e,
                    key = %file.relative_path,
                    "Failed to delete file from storage, continuing with metadata deletion"
                );
            }

            match self.metadata.delete(file.id).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::error!(error = %e, file_id = %file.id, "Failed to delete metadata record");
                }
            }
        }

        tracing::info!(removed, "Temporary file cleanup completed");

        Ok(removed)
    }

    async fn find_file(&self, id: Uuid) -> EngineResult<StoredFile> {
        self.metadata
            .find_by_id(id)
            .await
            .map_err(|e| EngineError::Metadata(e.to_string()))?
            .ok_or_else(|| EngineError::NotFound(format!("File not found: {}", id)))
    }

    /// Encryption applies when globally enabled and the type filter is empty
    /// or matches the upload's content type.
    fn encryption_applies(&self, content_type: &str) -> bool {
        self.settings.encryption_enabled()
            && validation::mime_matches_any(
                &self.settings.encryption_content_types(),
                content_type,
            )
    }

    /// Fail closed: when encryption is mandated but no secret is configured,
    /// the upload is rejected rather than silently stored as plaintext.
    fn encryption_service_required(&self) -> EngineResult<EncryptionService> {
        let secret = self.settings.encryption_key().ok_or_else(|| {
            EngineError::PayloadRejected(
                "Encryption is required but no encryption key is configured".to_string(),
            )
        })?;

        EncryptionService::from_secret(&secret)
    }

    /// Retrieve and decrypt an encrypted object, then slice the requested
    /// range from the plaintext. GCM authenticates the whole payload, so the
    /// full ciphertext is buffered regardless of the range.
    async fn decrypted_stream(
        &self,
        file: &StoredFile,
        range: Option<RangeRequest>,
    ) -> EngineResult<(ByteStream, u64, Option<ByteRange>)> {
        let plaintext = self.load_plaintext(file).await?;
        let total_size = plaintext.len() as u64;

        let resolved = resolve_range(range, total_size)?;
        let body = match resolved {
            Some(r) => Bytes::from(plaintext).slice(r.start as usize..=r.end as usize),
            None => Bytes::from(plaintext),
        };

        let stream: ByteStream =
            Box::pin(futures::stream::once(async move { Ok::<_, StorageError>(body) }));
        Ok((stream, total_size, resolved))
    }

    /// Load a file's full plaintext: collect the backend stream and decrypt
    /// when the record says the payload is encrypted at rest.
    async fn load_plaintext(&self, file: &StoredFile) -> EngineResult<Vec<u8>> {
        let backend = self.resolver.resolve(file.backend_id)?;
        let retrieved = backend.retrieve(&file.relative_path, None).await?;
        let raw = collect_stream(retrieved.stream).await?;

        if !file.is_encrypted {
            return Ok(raw);
        }

        let iv = file.encryption_iv.as_deref().ok_or_else(|| {
            EngineError::Internal(format!(
                "Encrypted file {} has no initialization vector",
                file.id
            ))
        })?;

        let secret = self.settings.encryption_key().ok_or_else(|| {
            EngineError::Internal(
                "File is encrypted but no encryption key is configured".to_string(),
            )
        })?;

        let service = EncryptionService::from_secret(&secret)?;
        service.decrypt_detached(&raw, iv)
    }

    /// Best-effort audit: failures are logged, never propagated.
    async fn audit_event(&self, action: &str, actor_id: Option<Uuid>, details: serde_json::Value) {
        if let Err(e) = self.audit.record(action, actor_id, details).await {
            tracing::warn!(error = %e, action, "Audit record failed");
        }
    }
}

/// Resolve a client range request against the object size: a missing end
/// defaults to the last byte; anything outside the object is rejected.
fn resolve_range(
    range: Option<RangeRequest>,
    total_size: u64,
) -> EngineResult<Option<ByteRange>> {
    let Some(range) = range else {
        return Ok(None);
    };

    if total_size == 0 {
        return Err(EngineError::InvalidRange(
            "Cannot satisfy a range against an empty object".to_string(),
        ));
    }

    let end = range.end.unwrap_or(total_size - 1);

    if range.start > end || end >= total_size {
        return Err(EngineError::InvalidRange(format!(
            "Range {}-{} outside object of {} bytes",
            range.start, end, total_size
        )));
    }

    Ok(Some(ByteRange::new(range.start, end)))
}

/// Drain a byte stream into memory.
async fn collect_stream(mut stream: ByteStream) -> EngineResult<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_range_defaults_end() {
        let resolved = resolve_range(Some(RangeRequest { start: 10, end: None }), 100).unwrap();
        assert_eq!(resolved, Some(ByteRange::new(10, 99)));
    }

    #[test]
    fn test_resolve_range_none_passthrough() {
        assert_eq!(resolve_range(None, 100).unwrap(), None);
    }

    #[test]
    fn test_resolve_range_rejects_out_of_bounds() {
        assert!(resolve_range(Some(RangeRequest { start: 0, end: Some(100) }), 100).is_err());
        assert!(resolve_range(Some(RangeRequest { start: 50, end: Some(10) }), 100).is_err());
        assert!(resolve_range(Some(RangeRequest { start: 0, end: None }), 0).is_err());
    }
}
