pub mod admin;
pub mod appointments;
pub mod auth;
pub mod health;
pub mod notes;
pub mod patients;
pub mod payments;
pub mod photos;
pub mod sync;
pub mod treatments;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   create staff account (admin)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout
/// /auth/me                                         current user
/// /auth/me/password                                change own password
/// /auth/sessions                                   own live sessions
///
/// /admin/users                                     list (admin)
/// /admin/users/{id}                                get, update, deactivate
/// /admin/users/{id}/reset-password                 reset password
///
/// /patients                                        list/search, create
/// /patients/{id}                                   get (with stats), update, delete
/// /patients/{id}/treatments                        plans of a patient
/// /patients/{id}/photos                            photos (?photo_type=)
/// /patients/{id}/payments                          payments
/// /patients/{id}/payments/summary                  balance summary
/// /patients/{id}/notes                             list, create
/// /patients/{id}/appointments                      appointments
///
/// /treatments                                      create plan
/// /treatments/{id}                                 get (with phases), update, delete
/// /treatments/{id}/phases                          list, create
/// /treatments/{id}/phases/{phase_id}               update, delete
/// /treatments/{id}/payment-plan                    generate installments
/// /treatments/{id}/payments                        payments of a plan
///
/// /photos                                          upload (multipart)
/// /photos/{id}                                     get, update, delete
///
/// /payments                                        create one-off
/// /payments/overdue                                overdue across patients
/// /payments/{id}                                   get
/// /payments/{id}/record                            record received money
/// /payments/{id}/status                            change status
///
/// /notes/{id}                                      update, delete
///
/// /appointments                                    list (filters), create
/// /appointments/{id}                               get, update, delete
///
/// /sync/legacy                                     run a pass now (admin)
/// /sync/legacy/runs                                run history (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/patients", patients::router())
        .nest("/treatments", treatments::router())
        .nest("/photos", photos::router())
        .nest("/payments", payments::router())
        .nest("/notes", notes::router())
        .nest("/appointments", appointments::router())
        .nest("/sync", sync::router())
}
