use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Which image backend is active (`"local"` or `"cdn"`).
    pub image_store: &'static str,
    pub legacy_sync_enabled: bool,
}

/// GET /health -- service, database and integration status.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = ortho_db::health_check(&state.pool).await.is_ok();
    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        image_store: state.image_store.name(),
        legacy_sync_enabled: state.sync_engine.is_some(),
    })
}

/// Mount health check routes at the root, outside `/api`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
