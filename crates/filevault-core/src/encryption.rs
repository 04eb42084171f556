//! At-rest payload encryption.
//!
//! Uses AES-256-GCM for authenticated encryption. Unlike token-style
//! encryption that prepends the nonce to the ciphertext, file payloads keep
//! the nonce detached: it is stored in the file's metadata record and handed
//! back at decryption time. The backend only ever sees ciphertext.

use crate::EngineError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

/// GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl EncryptionService {
    /// Create a new encryption service from raw 32-byte key (e.g. for tests).
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, EngineError> {
        if key_bytes.len() != 32 {
            return Err(EngineError::Internal(
                "Encryption key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create a new encryption service from a base64-encoded 32-byte secret,
    /// as held by the configuration store.
    pub fn from_secret(secret: &str) -> Result<Self, EngineError> {
        let key_bytes = general_purpose::STANDARD
            .decode(secret)
            .map_err(|e| EngineError::Internal(format!("Failed to decode encryption key: {}", e)))?;

        Self::from_key_bytes(&key_bytes)
    }

    /// Encrypt a payload with a freshly generated nonce.
    ///
    /// Returns the ciphertext and the base64 nonce to be stored in metadata.
    pub fn encrypt_detached(&self, plaintext: &[u8]) -> Result<(Vec<u8>, String), EngineError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| EngineError::Internal(format!("Encryption failed: {}", e)))?;

        Ok((ciphertext, general_purpose::STANDARD.encode(nonce)))
    }

    /// Decrypt a payload using the nonce recorded in metadata.
    pub fn decrypt_detached(&self, ciphertext: &[u8], iv: &str) -> Result<Vec<u8>, EngineError> {
        let nonce_bytes = general_purpose::STANDARD
            .decode(iv)
            .map_err(|e| EngineError::Internal(format!("Failed to decode nonce: {}", e)))?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(EngineError::Internal(format!(
                "Nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce_bytes.len()
            )));
        }

        let nonce = Nonce::from_slice(&nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| EngineError::Internal(format!("Decryption failed: {}", e)))
    }
}
