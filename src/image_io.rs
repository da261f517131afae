use std::path::Path;

use crate::client::{ClientError, Result, UploadFile};

/// Read a user-picked image file into the form the upload codec expects.
/// The bytes go to the server untouched; no decode happens here.
pub fn read_upload(path: &Path) -> Result<UploadFile> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = std::fs::read(path).map_err(|e| ClientError::Upload(e.to_string()))?;
    Ok(UploadFile { filename, bytes })
}

/// Decode fetched image bytes; `name` only labels the error.
pub fn decode_rgba(name: &str, bytes: &[u8]) -> Result<image::RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| ClientError::Decode(name.to_string(), e.to_string()))
}
