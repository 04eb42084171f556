//! Thumbnail derivation
//!
//! Thumbnails are derived on demand and never persisted. The source image is
//! fully decoded, resized preserving aspect ratio, and re-encoded to WebP at
//! the configured quality.

use anyhow::{anyhow, Result};
use bytes::Bytes;
use image::{GenericImageView, ImageReader};
use std::io::Cursor;

/// All thumbnails are encoded to a single efficient format.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/webp";

/// A derived thumbnail payload.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

pub struct Thumbnailer;

impl Thumbnailer {
    /// Derive a thumbnail bounded by `width` x `height` (aspect preserved;
    /// a missing height bounds width only), encoded as WebP at `quality`
    /// (1-100).
    pub fn generate(
        data: &[u8],
        width: u32,
        height: Option<u32>,
        quality: u8,
    ) -> Result<Thumbnail> {
        if width == 0 || height == Some(0) {
            return Err(anyhow!("Thumbnail dimensions must be non-zero"));
        }

        let cursor = Cursor::new(data);
        let img = ImageReader::new(cursor)
            .with_guessed_format()?
            .decode()
            .map_err(|e| anyhow!("Failed to decode image: {}", e))?;

        let bound_height = height.unwrap_or(u32::MAX);
        let resized = img.thumbnail(width, bound_height);

        let (out_width, out_height) = resized.dimensions();

        tracing::debug!(
            width = out_width,
            height = out_height,
            quality = quality,
            "Encoding thumbnail"
        );

        // Convert to RGBA for WebP encoding
        let rgba = resized.to_rgba8();
        let encoder = webp::Encoder::from_rgba(&rgba, out_width, out_height);
        let encoded = encoder.encode(quality.clamp(1, 100) as f32);

        Ok(Thumbnail {
            data: Bytes::copy_from_slice(&encoded),
            content_type: THUMBNAIL_CONTENT_TYPE,
            width: out_width,
            height: out_height,
        })
    }
}
