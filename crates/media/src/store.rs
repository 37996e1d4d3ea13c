//! The storage abstraction shared by all backends.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::MediaError;

/// Renditions a backend can serve for a stored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Original,
    Thumbnail,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
    /// `None` when the backend cannot produce resized renditions.
    pub thumbnail_url: Option<String>,
    pub bytes: usize,
}

/// A place to put patient photos.
///
/// Implementations must be thread-safe; the API holds one instance behind
/// an `Arc` for the lifetime of the process.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under `key`, replacing anything already there.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredImage, MediaError>;

    /// Remove the object stored under `key`. Removing a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), MediaError>;

    /// Public URL of a rendition.
    fn url_for(&self, key: &str, variant: Variant) -> String;

    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Reject keys that could escape the storage namespace.
pub(crate) fn validate_key(key: &str) -> Result<(), MediaError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(MediaError::InvalidKey(key.to_string()));
    }
    Ok(())
}
