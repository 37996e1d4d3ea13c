//! Clinical photo categories, upload limits, and storage key naming.

use uuid::Uuid;

use crate::error::CoreError;
use crate::types::DbId;

/// Default upper bound for a single uploaded photo (15 MiB).
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 15 * 1024 * 1024;

/// Maximum length of a free-text caption.
pub const MAX_CAPTION_LENGTH: usize = 500;

/// MIME types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

define_text_enum! {
    /// Standard orthodontic photo views.
    PhotoType("photo type") {
        Frontal => "FRONTAL",
        Profile => "PROFILE",
        Smile => "SMILE",
        IntraoralFrontal => "INTRAORAL_FRONTAL",
        IntraoralLeft => "INTRAORAL_LEFT",
        IntraoralRight => "INTRAORAL_RIGHT",
        OcclusalUpper => "OCCLUSAL_UPPER",
        OcclusalLower => "OCCLUSAL_LOWER",
        Xray => "XRAY",
        Other => "OTHER",
    }
}

/// Validate the declared content type of an upload.
pub fn validate_content_type(content_type: &str) -> Result<(), CoreError> {
    if ALLOWED_CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported image type '{content_type}'. Allowed: {}",
            ALLOWED_CONTENT_TYPES.join(", ")
        )))
    }
}

/// Validate upload size against the configured limit.
pub fn validate_size(len: usize, max_bytes: usize) -> Result<(), CoreError> {
    if len == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if len > max_bytes {
        return Err(CoreError::Validation(format!(
            "Uploaded file is {len} bytes; the limit is {max_bytes} bytes"
        )));
    }
    Ok(())
}

/// File extension for an accepted content type.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Build the object key under which a photo is stored.
///
/// Layout: `patients/{patient_id}/{photo_type}/{uuid}.{ext}` with the photo
/// type lowercased, so every patient's images share one prefix.
pub fn storage_key(patient_id: DbId, photo_type: PhotoType, id: Uuid, content_type: &str) -> String {
    format!(
        "patients/{patient_id}/{}/{id}.{}",
        photo_type.as_str().to_lowercase(),
        extension_for(content_type)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_allow_list() {
        assert!(validate_content_type("image/jpeg").is_ok());
        assert!(validate_content_type("image/webp").is_ok());
        assert!(validate_content_type("image/gif").is_err());
        assert!(validate_content_type("application/pdf").is_err());
    }

    #[test]
    fn size_limits() {
        assert!(validate_size(0, 10).is_err());
        assert!(validate_size(10, 10).is_ok());
        assert!(validate_size(11, 10).is_err());
    }

    #[test]
    fn storage_key_layout() {
        let id = Uuid::nil();
        let key = storage_key(42, PhotoType::IntraoralLeft, id, "image/png");
        assert_eq!(
            key,
            "patients/42/intraoral_left/00000000-0000-0000-0000-000000000000.png"
        );
    }

    #[test]
    fn unknown_photo_type_is_rejected() {
        assert!(PhotoType::parse("SELFIE").is_err());
        assert_eq!(PhotoType::parse("XRAY").unwrap(), PhotoType::Xray);
    }
}
