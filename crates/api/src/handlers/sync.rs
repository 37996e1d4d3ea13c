//! Handlers for `/sync/legacy` (manual legacy booking sync).

use axum::extract::{Query, State};
use axum::Json;
use ortho_db::models::legacy_sync_run::LegacySyncRun;
use ortho_db::repositories::LegacySyncRunRepo;
use ortho_sync::{SyncError, SyncReport};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/sync/legacy
///
/// Run one pass now and return its report. 409 while another pass (manual
/// or scheduled) holds the lock; 503 when no legacy database is configured.
pub async fn run_now(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<SyncReport>> {
    let engine = state.sync_engine.as_ref().ok_or(SyncError::NotConfigured)?;
    tracing::info!(user_id = admin.user_id, "Manual legacy sync requested");
    let report = engine.run_once(Some(admin.user_id)).await?;
    Ok(Json(report))
}

/// GET /api/sync/legacy/runs?limit=
pub async fn list_runs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<LegacySyncRun>>>> {
    let (limit, _) = page.resolve();
    let data = LegacySyncRunRepo::list_recent(&state.pool, limit).await?;
    Ok(Json(DataResponse { data }))
}
