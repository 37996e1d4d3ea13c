//! Route definitions for the `/photos` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::photo;
use crate::state::AppState;

/// Routes mounted at `/photos`.
///
/// ```text
/// POST   /        -> upload (multipart)
/// GET    /{id}    -> get_by_id
/// PUT    /{id}    -> update
/// DELETE /{id}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(photo::upload)).route(
        "/{id}",
        get(photo::get_by_id)
            .put(photo::update)
            .delete(photo::delete),
    )
}
