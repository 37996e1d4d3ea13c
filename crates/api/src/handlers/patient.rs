//! Handlers for the `/patients` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use ortho_core::contact::validate_phone;
use ortho_core::error::CoreError;
use ortho_core::patient::{validate_date_of_birth, validate_name};
use ortho_core::types::{Date, DbId};
use ortho_db::models::patient::{CreatePatient, Patient, PatientDetail, UpdatePatient};
use ortho_db::repositories::PatientRepo;
use serde::Deserialize;
use validator::Validate;

use super::{check, ensure_patient};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireStaff};
use crate::middleware::validation::ValidatedJson;
use crate::response::ListResponse;
use crate::state::AppState;

/// Request body for `POST /patients`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    #[validate(length(max = 30))]
    pub gender: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 200))]
    pub guardian_name: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

/// Request body for `PUT /patients/{id}`. All fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    #[validate(length(max = 30))]
    pub gender: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 200))]
    pub guardian_name: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

/// Query parameters for `GET /patients`.
#[derive(Debug, Deserialize)]
pub struct PatientListParams {
    /// Matches names, email, or phone digits.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_contact_and_dob(phone: Option<&str>, dob: Option<Date>) -> AppResult<()> {
    if let Some(phone) = phone {
        check(validate_phone(phone))?;
    }
    if let Some(dob) = dob {
        check(validate_date_of_birth(dob, Utc::now().date_naive()))?;
    }
    Ok(())
}

/// POST /api/patients
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    ValidatedJson(input): ValidatedJson<CreatePatientRequest>,
) -> AppResult<(StatusCode, Json<Patient>)> {
    check(validate_name("first_name", &input.first_name))?;
    check(validate_name("last_name", &input.last_name))?;
    validate_contact_and_dob(input.phone.as_deref(), input.date_of_birth)?;

    let dto = CreatePatient {
        first_name: input.first_name,
        last_name: input.last_name,
        date_of_birth: input.date_of_birth,
        gender: input.gender,
        email: input.email,
        phone: input.phone,
        address: input.address,
        guardian_name: input.guardian_name,
        medical_history: input.medical_history,
        allergies: input.allergies,
        source: None,
        created_by: Some(user.user_id),
    };
    let patient = PatientRepo::create(&state.pool, &dto).await?;

    tracing::info!(patient_id = patient.id, user_id = user.user_id, "Patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// GET /api/patients?search=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<PatientListParams>,
) -> AppResult<Json<ListResponse<Patient>>> {
    let limit = ortho_db::clamp_limit(params.limit);
    let offset = ortho_db::clamp_offset(params.offset);
    let (data, total) =
        PatientRepo::list(&state.pool, params.search.as_deref(), limit, offset).await?;
    Ok(Json(ListResponse { data, total }))
}

/// GET /api/patients/{id}
///
/// The patient plus chart aggregates (plans, photos, balance, next visit).
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<PatientDetail>> {
    let patient = ensure_patient(&state, id).await?;
    let stats = PatientRepo::stats(&state.pool, id).await?;
    Ok(Json(PatientDetail { patient, stats }))
}

/// PUT /api/patients/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdatePatientRequest>,
) -> AppResult<Json<Patient>> {
    if let Some(first) = input.first_name.as_deref() {
        check(validate_name("first_name", first))?;
    }
    if let Some(last) = input.last_name.as_deref() {
        check(validate_name("last_name", last))?;
    }
    validate_contact_and_dob(input.phone.as_deref(), input.date_of_birth)?;

    let dto = UpdatePatient {
        first_name: input.first_name,
        last_name: input.last_name,
        date_of_birth: input.date_of_birth,
        gender: input.gender,
        email: input.email,
        phone: input.phone,
        address: input.address,
        guardian_name: input.guardian_name,
        medical_history: input.medical_history,
        allergies: input.allergies,
    };
    let patient = PatientRepo::update(&state.pool, id, &dto)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Patient",
            id,
        }))?;

    tracing::info!(patient_id = id, user_id = user.user_id, "Patient updated");
    Ok(Json(patient))
}

/// DELETE /api/patients/{id}
///
/// Hard delete. Patients with plans, photos, payments, notes or
/// appointments are protected by foreign keys and yield 409.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if PatientRepo::delete(&state.pool, id).await? {
        tracing::info!(patient_id = id, user_id = admin.user_id, "Patient deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Patient",
            id,
        }))
    }
}
