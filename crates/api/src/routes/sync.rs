//! Route definitions for the `/sync` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sync;
use crate::state::AppState;

/// Routes mounted at `/sync`. Admin only.
///
/// ```text
/// POST /legacy        -> run_now
/// GET  /legacy/runs   -> list_runs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/legacy", post(sync::run_now))
        .route("/legacy/runs", get(sync::list_runs))
}
