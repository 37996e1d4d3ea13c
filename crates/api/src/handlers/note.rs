//! Handlers for clinical notes.
//!
//! Notes are created and listed under `/patients/{id}/notes`; edits and
//! removal go through `/notes/{id}` and are limited to the author or an
//! administrator.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use ortho_core::error::CoreError;
use ortho_core::notes::{can_modify, validate_content, NoteCategory};
use ortho_core::types::DbId;
use ortho_db::models::clinical_note::{ClinicalNote, CreateClinicalNote, UpdateClinicalNote};
use ortho_db::repositories::{ClinicalNoteRepo, TreatmentPlanRepo};
use serde::Deserialize;
use validator::Validate;

use super::ensure_patient;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::middleware::validation::ValidatedJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /patients/{id}/notes`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    pub content: String,
    pub category: Option<String>,
    pub treatment_plan_id: Option<DbId>,
}

/// Request body for `PUT /notes/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNoteRequest {
    pub content: Option<String>,
    pub category: Option<String>,
}

fn parse_category(raw: Option<&str>) -> AppResult<Option<String>> {
    Ok(raw
        .map(NoteCategory::parse)
        .transpose()?
        .map(|c| c.as_str().to_string()))
}

/// Load a note and check the caller may change it.
async fn find_modifiable(state: &AppState, id: DbId, user: &AuthUser) -> AppResult<ClinicalNote> {
    let note = ClinicalNoteRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ClinicalNote",
            id,
        }))?;
    if !can_modify(note.author_id, user.user_id, &user.role) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author or an administrator may change this note".into(),
        )));
    }
    Ok(note)
}

/// GET /api/patients/{id}/notes
pub async fn list_for_patient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ClinicalNote>>>> {
    ensure_patient(&state, patient_id).await?;
    let data = ClinicalNoteRepo::list_by_patient(&state.pool, patient_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/patients/{id}/notes
pub async fn create_for_patient(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CreateNoteRequest>,
) -> AppResult<(StatusCode, Json<ClinicalNote>)> {
    ensure_patient(&state, patient_id).await?;
    validate_content(&input.content)?;
    let category = parse_category(input.category.as_deref())?;

    if let Some(plan_id) = input.treatment_plan_id {
        let plan = TreatmentPlanRepo::find_by_id(&state.pool, plan_id).await?;
        if !plan.is_some_and(|p| p.patient_id == patient_id) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Treatment plan {plan_id} does not belong to patient {patient_id}"
            ))));
        }
    }

    let dto = CreateClinicalNote {
        patient_id,
        treatment_plan_id: input.treatment_plan_id,
        author_id: user.user_id,
        category,
        content: input.content,
    };
    let note = ClinicalNoteRepo::create(&state.pool, &dto).await?;

    tracing::info!(note_id = note.id, patient_id, user_id = user.user_id, "Clinical note created");
    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /api/notes/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateNoteRequest>,
) -> AppResult<Json<ClinicalNote>> {
    find_modifiable(&state, id, &user).await?;
    if let Some(content) = input.content.as_deref() {
        validate_content(content)?;
    }

    let dto = UpdateClinicalNote {
        category: parse_category(input.category.as_deref())?,
        content: input.content,
    };
    let note = ClinicalNoteRepo::update(&state.pool, id, &dto)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ClinicalNote",
            id,
        }))?;

    tracing::info!(note_id = id, user_id = user.user_id, "Clinical note updated");
    Ok(Json(note))
}

/// DELETE /api/notes/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_modifiable(&state, id, &user).await?;
    ClinicalNoteRepo::delete(&state.pool, id).await?;
    tracing::info!(note_id = id, user_id = user.user_id, "Clinical note deleted");
    Ok(StatusCode::NO_CONTENT)
}
