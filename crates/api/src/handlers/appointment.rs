//! Handlers for `/appointments`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ortho_core::appointment::{validate_duration, AppointmentStatus, DEFAULT_DURATION_MINUTES};
use ortho_core::error::CoreError;
use ortho_core::types::{DbId, Timestamp};
use ortho_db::models::appointment::{
    Appointment, AppointmentFilter, CreateAppointment, UpdateAppointment,
};
use ortho_db::repositories::AppointmentRepo;
use serde::Deserialize;
use validator::Validate;

use super::ensure_patient;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::middleware::validation::ValidatedJson;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /appointments`.
///
/// `from` is inclusive, `to` exclusive.
#[derive(Debug, Deserialize)]
pub struct AppointmentListParams {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub patient_id: Option<DbId>,
    pub doctor_id: Option<DbId>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /appointments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    pub patient_id: DbId,
    pub doctor_id: Option<DbId>,
    pub starts_at: Timestamp,
    pub duration_minutes: Option<i32>,
    pub status: Option<String>,
    #[validate(length(max = 100))]
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
}

/// Request body for `PUT /appointments/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    pub doctor_id: Option<DbId>,
    pub starts_at: Option<Timestamp>,
    pub duration_minutes: Option<i32>,
    pub status: Option<String>,
    #[validate(length(max = 100))]
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
}

fn parse_status(raw: Option<&str>) -> AppResult<Option<String>> {
    Ok(raw
        .map(AppointmentStatus::parse)
        .transpose()?
        .map(|s| s.as_str().to_string()))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Appointment",
        id,
    })
}

/// GET /api/appointments?from=&to=&patient_id=&doctor_id=&status=
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<AppointmentListParams>,
) -> AppResult<Json<DataResponse<Vec<Appointment>>>> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if to <= from {
            return Err(AppError::Core(CoreError::Validation(
                "'to' must be after 'from'".into(),
            )));
        }
    }
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let filter = AppointmentFilter {
        from: params.from,
        to: params.to,
        patient_id: params.patient_id,
        doctor_id: params.doctor_id,
        status: parse_status(params.status.as_deref())?,
        limit,
        offset,
    };
    let data = AppointmentRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/patients/{id}/appointments
pub async fn list_for_patient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(patient_id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Appointment>>>> {
    ensure_patient(&state, patient_id).await?;
    let (limit, offset) = page.resolve();
    let filter = AppointmentFilter {
        patient_id: Some(patient_id),
        limit,
        offset,
        ..Default::default()
    };
    let data = AppointmentRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/appointments
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    ValidatedJson(input): ValidatedJson<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let duration_minutes = input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    validate_duration(duration_minutes)?;

    let dto = CreateAppointment {
        patient_id: input.patient_id,
        doctor_id: input.doctor_id,
        starts_at: input.starts_at,
        duration_minutes,
        status: parse_status(input.status.as_deref())?,
        appointment_type: input.appointment_type,
        notes: input.notes,
        source: None,
        legacy_booking_number: None,
        legacy_updated_at: None,
    };
    let appointment = AppointmentRepo::create(&state.pool, &dto).await?;

    tracing::info!(
        appointment_id = appointment.id,
        patient_id = appointment.patient_id,
        user_id = user.user_id,
        "Appointment created"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// GET /api/appointments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<Appointment>> {
    let appointment = AppointmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(appointment))
}

/// PUT /api/appointments/{id}
///
/// Edits to synchronized appointments are kept until the legacy system
/// reports a newer change to the same booking.
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateAppointmentRequest>,
) -> AppResult<Json<Appointment>> {
    if let Some(minutes) = input.duration_minutes {
        validate_duration(minutes)?;
    }

    let dto = UpdateAppointment {
        doctor_id: input.doctor_id,
        starts_at: input.starts_at,
        duration_minutes: input.duration_minutes,
        status: parse_status(input.status.as_deref())?,
        appointment_type: input.appointment_type,
        notes: input.notes,
        legacy_updated_at: None,
    };
    let appointment = AppointmentRepo::update(&state.pool, id, &dto)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(appointment_id = id, user_id = user.user_id, "Appointment updated");
    Ok(Json(appointment))
}

/// DELETE /api/appointments/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if AppointmentRepo::delete(&state.pool, id).await? {
        tracing::info!(appointment_id = id, user_id = user.user_id, "Appointment deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
