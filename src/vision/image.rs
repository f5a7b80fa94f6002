//! Image encoding for API payloads.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::fs;
use std::path::Path;

use super::error::VisionError;

/// Prefix of every encoded image. The content is never inspected, so the
/// MIME type is always reported as JPEG.
pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Read an image file and encode it as a base64 data URI.
pub fn encode_image(path: impl AsRef<Path>) -> Result<String, VisionError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| VisionError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(encode_image_bytes(&bytes))
}

/// Encode raw bytes as a base64 data URI.
pub fn encode_image_bytes(bytes: &[u8]) -> String {
    format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(bytes))
}
