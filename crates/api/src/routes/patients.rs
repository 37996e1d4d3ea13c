//! Route definitions for the `/patients` resource and its chart views.

use axum::routing::get;
use axum::Router;

use crate::handlers::{appointment, note, patient, payment, photo, treatment};
use crate::state::AppState;

/// Routes mounted at `/patients`.
///
/// ```text
/// GET    /                          -> patient::list
/// POST   /                          -> patient::create
/// GET    /{id}                      -> patient::get_by_id
/// PUT    /{id}                      -> patient::update
/// DELETE /{id}                      -> patient::delete (admin)
/// GET    /{id}/treatments           -> treatment::list_for_patient
/// GET    /{id}/photos               -> photo::list_for_patient
/// GET    /{id}/payments             -> payment::list_for_patient
/// GET    /{id}/payments/summary     -> payment::summary_for_patient
/// GET    /{id}/notes                -> note::list_for_patient
/// POST   /{id}/notes                -> note::create_for_patient
/// GET    /{id}/appointments         -> appointment::list_for_patient
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(patient::list).post(patient::create))
        .route(
            "/{id}",
            get(patient::get_by_id)
                .put(patient::update)
                .delete(patient::delete),
        )
        .route("/{id}/treatments", get(treatment::list_for_patient))
        .route("/{id}/photos", get(photo::list_for_patient))
        .route("/{id}/payments", get(payment::list_for_patient))
        .route("/{id}/payments/summary", get(payment::summary_for_patient))
        .route(
            "/{id}/notes",
            get(note::list_for_patient).post(note::create_for_patient),
        )
        .route("/{id}/appointments", get(appointment::list_for_patient))
}
