use std::path::PathBuf;

use ortho_core::photo::DEFAULT_MAX_PHOTO_BYTES;

use crate::error::MediaError;

/// Credentials and endpoints for the image CDN.
#[derive(Clone)]
pub struct CdnConfig {
    pub upload_url: String,
    pub delivery_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Namespace prepended to every public id.
    pub folder: String,
}

impl std::fmt::Debug for CdnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnConfig")
            .field("upload_url", &self.upload_url)
            .field("delivery_url", &self.delivery_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .finish()
    }
}

/// Which backend stores photo bytes.
#[derive(Debug, Clone)]
pub enum MediaBackend {
    Local,
    Cdn(CdnConfig),
}

/// Photo storage configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    /// Directory used by the local backend.
    pub local_root: PathBuf,
    /// URL prefix under which the local backend's files are served.
    pub public_base_url: String,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl MediaConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                  | Default                          |
    /// |--------------------------|----------------------------------|
    /// | `MEDIA_BACKEND`          | `local`                          |
    /// | `MEDIA_LOCAL_ROOT`       | `storage/photos`                 |
    /// | `MEDIA_PUBLIC_BASE_URL`  | `http://localhost:3000/media`    |
    /// | `MEDIA_MAX_UPLOAD_BYTES` | `15728640` (15 MiB)              |
    /// | `CDN_UPLOAD_URL`         | required when backend is `cdn`   |
    /// | `CDN_DELIVERY_URL`       | required when backend is `cdn`   |
    /// | `CDN_API_KEY`            | required when backend is `cdn`   |
    /// | `CDN_API_SECRET`         | required when backend is `cdn`   |
    /// | `CDN_FOLDER`             | `ortho`                          |
    pub fn from_env() -> Result<Self, MediaError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MediaError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| MediaError::Config(format!("{name} must be set for the cdn backend")))
        };

        let backend = match get("MEDIA_BACKEND").as_deref().unwrap_or("local") {
            "local" => MediaBackend::Local,
            "cdn" => MediaBackend::Cdn(CdnConfig {
                upload_url: require("CDN_UPLOAD_URL")?,
                delivery_url: require("CDN_DELIVERY_URL")?,
                api_key: require("CDN_API_KEY")?,
                api_secret: require("CDN_API_SECRET")?,
                folder: get("CDN_FOLDER").unwrap_or_else(|| "ortho".into()),
            }),
            other => {
                return Err(MediaError::Config(format!(
                    "MEDIA_BACKEND must be 'local' or 'cdn', got '{other}'"
                )))
            }
        };

        let max_upload_bytes = match get("MEDIA_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse().map_err(|_| {
                MediaError::Config("MEDIA_MAX_UPLOAD_BYTES must be a valid usize".into())
            })?,
            None => DEFAULT_MAX_PHOTO_BYTES,
        };

        Ok(Self {
            backend,
            local_root: get("MEDIA_LOCAL_ROOT")
                .unwrap_or_else(|| "storage/photos".into())
                .into(),
            public_base_url: get("MEDIA_PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000/media".into()),
            max_upload_bytes,
        })
    }

    /// Local backend rooted at `root`, used by tests and development tooling.
    pub fn local(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            backend: MediaBackend::Local,
            local_root: root.into(),
            public_base_url: public_base_url.to_string(),
            max_upload_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }
}
