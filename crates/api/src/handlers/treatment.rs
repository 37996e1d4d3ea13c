//! Handlers for `/treatments`: plans, their phases, and installment plans.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use ortho_core::error::CoreError;
use ortho_core::payment::{generate_installments, InstallmentPlanInput, PaymentStatus};
use ortho_core::treatment::{
    validate_date_range, validate_phase_order, validate_status_transition, validate_title,
    PhaseStatus, TreatmentStatus, TreatmentType,
};
use ortho_core::types::{Cents, Date, DbId};
use ortho_db::models::payment::{CreatePayment, Payment};
use ortho_db::models::treatment::{
    CreateTreatmentPhase, CreateTreatmentPlan, TreatmentPhase, TreatmentPlan,
    TreatmentPlanDetail, UpdateTreatmentPhase, UpdateTreatmentPlan,
};
use ortho_db::repositories::{PaymentRepo, TreatmentPhaseRepo, TreatmentPlanRepo};
use serde::Deserialize;
use validator::Validate;

use super::{ensure_patient, ensure_plan};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireClinician, RequireStaff};
use crate::middleware::validation::ValidatedJson;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /treatments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    pub patient_id: DbId,
    /// Defaults to the caller when the caller is a doctor.
    pub doctor_id: Option<DbId>,
    pub title: String,
    pub treatment_type: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    #[validate(range(min = 0, message = "total_cost_cents must not be negative"))]
    pub total_cost_cents: Option<Cents>,
}

/// Request body for `PUT /treatments/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    pub doctor_id: Option<DbId>,
    pub title: Option<String>,
    pub treatment_type: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    #[validate(range(min = 0, message = "total_cost_cents must not be negative"))]
    pub total_cost_cents: Option<Cents>,
}

/// Request body for `POST /treatments/{id}/phases`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePhaseRequest {
    pub name: String,
    pub description: Option<String>,
    pub phase_order: i32,
    pub status: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// Request body for `PUT /treatments/{id}/phases/{phase_id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePhaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub phase_order: Option<i32>,
    pub status: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// Request body for `POST /treatments/{id}/payment-plan`.
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentPlanRequest {
    #[validate(range(min = 1, message = "total_cents must be positive"))]
    pub total_cents: Cents,
    #[serde(default)]
    #[validate(range(min = 0, message = "down_payment_cents must not be negative"))]
    pub down_payment_cents: Cents,
    pub installment_count: u32,
    pub first_due_date: Date,
    #[serde(default = "default_interval_months")]
    pub interval_months: u32,
}

fn default_interval_months() -> u32 {
    1
}

impl From<PaymentPlanRequest> for InstallmentPlanInput {
    fn from(req: PaymentPlanRequest) -> Self {
        InstallmentPlanInput {
            total_cents: req.total_cents,
            down_payment_cents: req.down_payment_cents,
            installment_count: req.installment_count,
            first_due_date: req.first_due_date,
            interval_months: req.interval_months,
        }
    }
}

fn plan_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "TreatmentPlan",
        id,
    })
}

fn phase_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "TreatmentPhase",
        id,
    })
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// POST /api/treatments
///
/// New plans always start as `PLANNED`. A missing patient surfaces as
/// `INVALID_REFERENCE` from the foreign key.
pub async fn create(
    State(state): State<AppState>,
    RequireClinician(user): RequireClinician,
    ValidatedJson(input): ValidatedJson<CreatePlanRequest>,
) -> AppResult<(StatusCode, Json<TreatmentPlan>)> {
    validate_title("title", &input.title)?;
    let treatment_type = TreatmentType::parse(&input.treatment_type)?;
    validate_date_range(input.start_date, input.estimated_end_date)?;

    let doctor_id = input
        .doctor_id
        .or_else(|| user.is_doctor().then_some(user.user_id));

    let dto = CreateTreatmentPlan {
        patient_id: input.patient_id,
        doctor_id,
        title: input.title.trim().to_string(),
        treatment_type: treatment_type.as_str().to_string(),
        status: None,
        description: input.description,
        start_date: input.start_date,
        estimated_end_date: input.estimated_end_date,
        total_cost_cents: input.total_cost_cents,
    };
    let plan = TreatmentPlanRepo::create(&state.pool, &dto).await?;

    tracing::info!(
        plan_id = plan.id,
        patient_id = plan.patient_id,
        user_id = user.user_id,
        "Treatment plan created"
    );
    Ok((StatusCode::CREATED, Json(plan)))
}

/// GET /api/treatments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<TreatmentPlanDetail>> {
    let plan = ensure_plan(&state, id).await?;
    let phases = TreatmentPhaseRepo::list_by_plan(&state.pool, id).await?;
    Ok(Json(TreatmentPlanDetail { plan, phases }))
}

/// GET /api/patients/{id}/treatments
pub async fn list_for_patient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TreatmentPlan>>>> {
    ensure_patient(&state, patient_id).await?;
    let data = TreatmentPlanRepo::list_by_patient(&state.pool, patient_id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/treatments/{id}
///
/// Status changes must follow the plan lifecycle; completed and cancelled
/// plans are read-only. Completing a plan stamps `actual_end_date` with
/// today unless the caller supplies one.
pub async fn update(
    State(state): State<AppState>,
    RequireClinician(user): RequireClinician,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdatePlanRequest>,
) -> AppResult<Json<TreatmentPlan>> {
    let current = ensure_plan(&state, id).await?;
    let current_status = TreatmentStatus::parse(&current.status)?;

    if current_status.is_terminal() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Treatment plan is {current_status} and can no longer be changed"
        ))));
    }

    let next_status = input
        .status
        .as_deref()
        .map(TreatmentStatus::parse)
        .transpose()?;
    if let Some(next) = next_status {
        validate_status_transition(current_status, next)?;
    }
    if let Some(title) = input.title.as_deref() {
        validate_title("title", title)?;
    }
    let treatment_type = input
        .treatment_type
        .as_deref()
        .map(TreatmentType::parse)
        .transpose()?;

    let start = input.start_date.or(current.start_date);
    validate_date_range(start, input.estimated_end_date.or(current.estimated_end_date))?;
    let actual_end_date = match (next_status, input.actual_end_date) {
        (_, Some(date)) => Some(date),
        (Some(TreatmentStatus::Completed), None) => Some(Utc::now().date_naive()),
        _ => None,
    };
    validate_date_range(start, actual_end_date)?;

    let dto = UpdateTreatmentPlan {
        doctor_id: input.doctor_id,
        title: input.title.map(|t| t.trim().to_string()),
        treatment_type: treatment_type.map(|t| t.as_str().to_string()),
        status: next_status.map(|s| s.as_str().to_string()),
        description: input.description,
        start_date: input.start_date,
        estimated_end_date: input.estimated_end_date,
        actual_end_date,
        total_cost_cents: input.total_cost_cents,
    };
    let plan = TreatmentPlanRepo::update(&state.pool, id, &dto)
        .await?
        .ok_or_else(|| plan_not_found(id))?;

    tracing::info!(plan_id = id, status = %plan.status, user_id = user.user_id, "Treatment plan updated");
    Ok(Json(plan))
}

/// DELETE /api/treatments/{id}
///
/// Removes the plan and its phases. Plans with payments yield 409.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if TreatmentPlanRepo::delete(&state.pool, id).await? {
        tracing::info!(plan_id = id, user_id = admin.user_id, "Treatment plan deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(plan_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// GET /api/treatments/{id}/phases
pub async fn list_phases(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(plan_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TreatmentPhase>>>> {
    ensure_plan(&state, plan_id).await?;
    let data = TreatmentPhaseRepo::list_by_plan(&state.pool, plan_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/treatments/{id}/phases
///
/// A duplicate `phase_order` within the plan yields 409.
pub async fn create_phase(
    State(state): State<AppState>,
    RequireClinician(user): RequireClinician,
    Path(plan_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CreatePhaseRequest>,
) -> AppResult<(StatusCode, Json<TreatmentPhase>)> {
    ensure_plan(&state, plan_id).await?;
    validate_title("name", &input.name)?;
    validate_phase_order(input.phase_order)?;
    validate_date_range(input.start_date, input.end_date)?;
    let status = input
        .status
        .as_deref()
        .map(PhaseStatus::parse)
        .transpose()?;

    let dto = CreateTreatmentPhase {
        treatment_plan_id: plan_id,
        name: input.name.trim().to_string(),
        description: input.description,
        phase_order: input.phase_order,
        status: status.map(|s| s.as_str().to_string()),
        start_date: input.start_date,
        end_date: input.end_date,
    };
    let phase = TreatmentPhaseRepo::create(&state.pool, &dto).await?;

    tracing::info!(plan_id, phase_id = phase.id, user_id = user.user_id, "Treatment phase created");
    Ok((StatusCode::CREATED, Json(phase)))
}

/// PUT /api/treatments/{id}/phases/{phase_id}
pub async fn update_phase(
    State(state): State<AppState>,
    RequireClinician(user): RequireClinician,
    Path((plan_id, phase_id)): Path<(DbId, DbId)>,
    ValidatedJson(input): ValidatedJson<UpdatePhaseRequest>,
) -> AppResult<Json<TreatmentPhase>> {
    let current = TreatmentPhaseRepo::find_by_id(&state.pool, plan_id, phase_id)
        .await?
        .ok_or_else(|| phase_not_found(phase_id))?;

    if let Some(name) = input.name.as_deref() {
        validate_title("name", name)?;
    }
    if let Some(order) = input.phase_order {
        validate_phase_order(order)?;
    }
    validate_date_range(
        input.start_date.or(current.start_date),
        input.end_date.or(current.end_date),
    )?;
    let status = input
        .status
        .as_deref()
        .map(PhaseStatus::parse)
        .transpose()?;

    let dto = UpdateTreatmentPhase {
        name: input.name.map(|n| n.trim().to_string()),
        description: input.description,
        phase_order: input.phase_order,
        status: status.map(|s| s.as_str().to_string()),
        start_date: input.start_date,
        end_date: input.end_date,
    };
    let phase = TreatmentPhaseRepo::update(&state.pool, plan_id, phase_id, &dto)
        .await?
        .ok_or_else(|| phase_not_found(phase_id))?;

    tracing::info!(plan_id, phase_id, user_id = user.user_id, "Treatment phase updated");
    Ok(Json(phase))
}

/// DELETE /api/treatments/{id}/phases/{phase_id}
pub async fn delete_phase(
    State(state): State<AppState>,
    RequireClinician(user): RequireClinician,
    Path((plan_id, phase_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if TreatmentPhaseRepo::delete(&state.pool, plan_id, phase_id).await? {
        tracing::info!(plan_id, phase_id, user_id = user.user_id, "Treatment phase deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(phase_not_found(phase_id))
    }
}

// ---------------------------------------------------------------------------
// Payment plan
// ---------------------------------------------------------------------------

/// POST /api/treatments/{id}/payment-plan
///
/// Splits the fee into installments and stores them as `PENDING` payments
/// in one transaction. Rejected with 409 while the plan still has any
/// payment that is not cancelled.
pub async fn create_payment_plan(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(plan_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<PaymentPlanRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<Payment>>>)> {
    let plan = ensure_plan(&state, plan_id).await?;
    if plan.status == TreatmentStatus::Cancelled.as_str() {
        return Err(AppError::Core(CoreError::Conflict(
            "Cannot schedule payments for a cancelled treatment plan".into(),
        )));
    }

    let input = InstallmentPlanInput::from(input);
    let schedule = generate_installments(&input)?;
    let installment_total = schedule.iter().filter(|i| !i.is_down_payment).count();

    let mut installment_no = 0;
    let inputs: Vec<CreatePayment> = schedule
        .iter()
        .map(|item| {
            let description = if item.is_down_payment {
                "Down payment".to_string()
            } else {
                installment_no += 1;
                format!("Installment {installment_no} of {installment_total}")
            };
            CreatePayment {
                patient_id: plan.patient_id,
                treatment_plan_id: Some(plan_id),
                sequence: Some(item.sequence),
                amount_cents: item.amount_cents,
                status: Some(PaymentStatus::Pending.as_str().to_string()),
                due_date: Some(item.due_date),
                description: Some(description),
                created_by: Some(user.user_id),
            }
        })
        .collect();

    let payments = PaymentRepo::create_schedule(&state.pool, plan_id, &inputs)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Treatment plan already has a payment schedule".into(),
            ))
        })?;

    tracing::info!(
        plan_id,
        count = payments.len(),
        total_cents = input.total_cents,
        user_id = user.user_id,
        "Payment plan generated"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: payments })))
}

/// GET /api/treatments/{id}/payments
pub async fn list_payments(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(plan_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    ensure_plan(&state, plan_id).await?;
    let data = PaymentRepo::list_by_plan(&state.pool, plan_id).await?;
    Ok(Json(DataResponse { data }))
}
