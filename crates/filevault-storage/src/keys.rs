//! Shared path derivation for storage backends.
//!
//! Generated names are a fresh random identifier plus the sanitized original
//! extension, so the on-disk name never carries attacker-controlled
//! characters. Prefixes shard permanent files by top-level MIME category and
//! upload date, which bounds directory fan-out; temporary files land in a
//! fixed `temp` bucket the cleanup sweep knows about.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

/// Bucket for temporary files.
pub const TEMP_FOLDER: &str = "temp";

const MAX_EXTENSION_LEN: usize = 10;

/// Generate a collision-free on-disk name for an uploaded file.
///
/// Collision probability is made negligible by random generation; creation
/// is a single attempt with no retry.
pub fn generated_name(original_name: &str) -> String {
    let id = Uuid::new_v4().simple();
    match sanitize_extension(original_name) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

/// Extract and sanitize the extension of an original filename: ASCII
/// alphanumerics only, lowercased, bounded length. Anything else is dropped.
pub fn sanitize_extension(original_name: &str) -> Option<String> {
    let ext = original_name.rsplit_once('.').map(|(_, ext)| ext)?;
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Derive the storage folder for an upload: `temp` for temporary files,
/// `{category}/{yyyy}/{mm}/{dd}` for permanent ones.
pub fn storage_prefix(content_type: &str, temporary: bool, now: DateTime<Utc>) -> String {
    if temporary {
        return TEMP_FOLDER.to_string();
    }

    format!(
        "{}/{:04}/{:02}/{:02}",
        mime_category(content_type),
        now.year(),
        now.month(),
        now.day()
    )
}

/// Sanitized top-level MIME type (`image/png` -> `image`); `other` when the
/// content type yields nothing usable.
fn mime_category(content_type: &str) -> String {
    let category: String = content_type
        .split('/')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if category.is_empty() {
        "other".to_string()
    } else {
        category
    }
}
