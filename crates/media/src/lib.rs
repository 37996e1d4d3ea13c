//! Photo storage backends.
//!
//! Handlers talk to an [`ImageStore`] trait object; which backend sits
//! behind it is decided once at startup from [`MediaConfig`].

use std::sync::Arc;

pub mod cdn;
pub mod config;
pub mod error;
pub mod inspect;
pub mod local;
pub mod store;

pub use cdn::CdnImageStore;
pub use config::{MediaBackend, MediaConfig};
pub use error::MediaError;
pub use inspect::{inspect_image, ImageInfo};
pub use local::LocalImageStore;
pub use store::{ImageStore, StoredImage, Variant};

/// Construct the configured image store.
pub fn build_store(config: &MediaConfig) -> Result<Arc<dyn ImageStore>, MediaError> {
    match &config.backend {
        MediaBackend::Local => Ok(Arc::new(LocalImageStore::new(
            &config.local_root,
            &config.public_base_url,
        ))),
        MediaBackend::Cdn(cdn) => Ok(Arc::new(CdnImageStore::new(cdn.clone())?)),
    }
}
