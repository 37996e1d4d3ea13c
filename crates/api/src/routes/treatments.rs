//! Route definitions for the `/treatments` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::treatment;
use crate::state::AppState;

/// Routes mounted at `/treatments`.
///
/// ```text
/// POST   /                          -> create (clinician)
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update (clinician)
/// DELETE /{id}                      -> delete (admin)
/// GET    /{id}/phases               -> list_phases
/// POST   /{id}/phases               -> create_phase (clinician)
/// PUT    /{id}/phases/{phase_id}    -> update_phase (clinician)
/// DELETE /{id}/phases/{phase_id}    -> delete_phase (clinician)
/// POST   /{id}/payment-plan         -> create_payment_plan
/// GET    /{id}/payments             -> list_payments
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(treatment::create))
        .route(
            "/{id}",
            get(treatment::get_by_id)
                .put(treatment::update)
                .delete(treatment::delete),
        )
        .route(
            "/{id}/phases",
            get(treatment::list_phases).post(treatment::create_phase),
        )
        .route(
            "/{id}/phases/{phase_id}",
            put(treatment::update_phase).delete(treatment::delete_phase),
        )
        .route("/{id}/payment-plan", post(treatment::create_payment_plan))
        .route("/{id}/payments", get(treatment::list_payments))
}
