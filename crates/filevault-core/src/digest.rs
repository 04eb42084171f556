//! Content digests for stored files.
//!
//! Both digests are computed over the original plaintext bytes, before any
//! encryption, so clients can verify integrity regardless of how the payload
//! is stored at rest.

use md5::Md5;
use sha2::{Digest, Sha256};

/// Plaintext digests recorded in file metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigests {
    pub md5: String,
    pub sha256: String,
}

impl ContentDigests {
    /// Compute both digests over the given bytes, hex encoded.
    pub fn compute(data: &[u8]) -> Self {
        let mut md5 = Md5::new();
        md5.update(data);

        let mut sha256 = Sha256::new();
        sha256.update(data);

        Self {
            md5: hex::encode(md5.finalize()),
            sha256: hex::encode(sha256.finalize()),
        }
    }
}
