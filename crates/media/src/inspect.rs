//! Header-only image inspection.
//!
//! Only the image header is decoded, so checking a multi-megabyte photo
//! costs microseconds and never allocates a pixel buffer.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use serde::Serialize;

use crate::error::MediaError;

/// What the bytes actually are, regardless of the declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Sniff the format and read dimensions from an encoded image.
///
/// Only JPEG, PNG, and WebP are accepted.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo, MediaError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MediaError::InvalidImage(e.to_string()))?;

    let content_type = match reader.format() {
        Some(ImageFormat::Jpeg) => "image/jpeg",
        Some(ImageFormat::Png) => "image/png",
        Some(ImageFormat::WebP) => "image/webp",
        Some(other) => {
            return Err(MediaError::InvalidImage(format!(
                "Unsupported image format {other:?}"
            )))
        }
        None => return Err(MediaError::InvalidImage("Unrecognized image data".into())),
    };

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| MediaError::InvalidImage(e.to_string()))?;

    Ok(ImageInfo {
        content_type,
        width,
        height,
    })
}
