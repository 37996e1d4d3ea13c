use std::sync::Arc;

use ortho_media::ImageStore;
use ortho_sync::SyncEngine;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything is a pool handle or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: ortho_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Backend that holds photo bytes (local disk or CDN).
    pub image_store: Arc<dyn ImageStore>,
    /// `None` when `LEGACY_DATABASE_URL` is unset.
    pub sync_engine: Option<Arc<SyncEngine>>,
}
