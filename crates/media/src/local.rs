//! Filesystem-backed image store for development and single-host installs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::MediaError;
use crate::store::{validate_key, ImageStore, StoredImage, Variant};

/// Stores images under a root directory and serves them from a static URL prefix.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl AsRef<Path>, public_base_url: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Root directory images are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, MediaError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredImage, MediaError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let len = bytes.len();
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(key, bytes = len, "Stored image on local filesystem");

        Ok(StoredImage {
            key: key.to_string(),
            url: self.url_for(key, Variant::Original),
            thumbnail_url: None,
            bytes: len,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), MediaError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The filesystem has no resizer, so every variant is the original file.
    fn url_for(&self, key: &str, _variant: Variant) -> String {
        format!("{}/{key}", self.public_base_url)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
