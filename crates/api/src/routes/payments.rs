//! Route definitions for the `/payments` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::payment;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST /               -> create
/// GET  /overdue        -> list_overdue
/// GET  /{id}           -> get_by_id
/// POST /{id}/record    -> record
/// PUT  /{id}/status    -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(payment::create))
        .route("/overdue", get(payment::list_overdue))
        .route("/{id}", get(payment::get_by_id))
        .route("/{id}/record", post(payment::record))
        .route("/{id}/status", put(payment::update_status))
}
