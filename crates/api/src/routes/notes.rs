//! Route definitions for the `/notes` resource.

use axum::routing::put;
use axum::Router;

use crate::handlers::note;
use crate::state::AppState;

/// Routes mounted at `/notes`.
///
/// ```text
/// PUT    /{id}    -> update (author or admin)
/// DELETE /{id}    -> delete (author or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", put(note::update).delete(note::delete))
}
