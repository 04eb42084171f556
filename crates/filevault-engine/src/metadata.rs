//! Metadata store collaborator
//!
//! Relational persistence of file metadata lives outside this engine. The
//! engine consumes this trait only; the platform's repository layer
//! implements it, and tests use an in-memory fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filevault_core::{NewStoredFile, StoredFile};
use uuid::Uuid;

#[async_trait]
pub trait FileMetadataStore: Send + Sync {
    /// Persist a new record; the store assigns id and creation time.
    async fn create(&self, file: NewStoredFile) -> Result<StoredFile, anyhow::Error>;

    /// Look up a record by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredFile>, anyhow::Error>;

    /// All temporary records whose expiry instant has passed.
    async fn find_expired_temporary(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoredFile>, anyhow::Error>;

    /// Remove a record. Removing an already-deleted id is a no-op.
    async fn delete(&self, id: Uuid) -> Result<(), anyhow::Error>;
}
