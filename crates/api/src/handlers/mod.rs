pub mod admin;
pub mod appointment;
pub mod auth;
pub mod note;
pub mod patient;
pub mod payment;
pub mod photo;
pub mod sync;
pub mod treatment;

use ortho_core::error::CoreError;
use ortho_core::types::DbId;
use ortho_db::models::patient::Patient;
use ortho_db::models::treatment::TreatmentPlan;
use ortho_db::repositories::{PatientRepo, TreatmentPlanRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Load a patient or fail with 404. Used by the nested `/patients/{id}/...`
/// listings so an unknown patient is not reported as an empty list.
pub(crate) async fn ensure_patient(state: &AppState, id: DbId) -> AppResult<Patient> {
    PatientRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Patient",
            id,
        }))
}

/// Load a treatment plan or fail with 404.
pub(crate) async fn ensure_plan(state: &AppState, id: DbId) -> AppResult<TreatmentPlan> {
    TreatmentPlanRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TreatmentPlan",
            id,
        }))
}

/// Turn a core rule's `Err(String)` into a validation error.
pub(crate) fn check(result: Result<(), String>) -> AppResult<()> {
    result.map_err(|msg| AppError::Core(CoreError::Validation(msg)))
}
