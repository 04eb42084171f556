//! Filevault Processing Library
//!
//! Image thumbnail derivation: decode, resize, re-encode. Thumbnailing is
//! the one path that buffers whole payloads - decoding needs random access.

pub mod thumbnail;

pub use thumbnail::{Thumbnail, Thumbnailer, THUMBNAIL_CONTENT_TYPE};
