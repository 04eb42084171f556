use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Storage backend identifiers
///
/// This enum defines the available storage backend types. It lives in core
/// because it appears both in configuration and in file metadata records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendId {
    Local,
}

impl FromStr for StorageBackendId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackendId::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackendId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackendId::Local => write!(f, "local"),
        }
    }
}

/// Outcome of the (external) malware scan. The engine only ever sets the
/// default; scanning itself happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[default]
    Pending,
    Clean,
    Infected,
    Failed,
}

/// Metadata record for a stored file.
///
/// Owned by the external metadata store; shaped here because every field is
/// produced by the upload path. `size_bytes` reflects the stored payload
/// (ciphertext length when encryption was applied), while the checksums
/// always describe the original plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub original_name: String,
    pub generated_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub relative_path: String,
    pub backend_id: StorageBackendId,
    pub owner_id: Option<Uuid>,
    pub is_temporary: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub checksum_md5: String,
    pub checksum_sha256: String,
    pub is_encrypted: bool,
    /// Base64 nonce required to decrypt; present iff `is_encrypted`.
    pub encryption_iv: Option<String>,
    pub scan_status: ScanStatus,
    pub created_at: DateTime<Utc>,
}

/// Creation payload handed to the metadata store. The store assigns
/// `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub original_name: String,
    pub generated_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub relative_path: String,
    pub backend_id: StorageBackendId,
    pub owner_id: Option<Uuid>,
    pub is_temporary: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub checksum_md5: String,
    pub checksum_sha256: String,
    pub is_encrypted: bool,
    pub encryption_iv: Option<String>,
    pub scan_status: ScanStatus,
}

impl StoredFile {
    /// True once a temporary file's expiry instant has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_temporary && self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}
