//! Handlers for `/payments` and the per-patient payment views.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use ortho_core::error::CoreError;
use ortho_core::payment::{apply_payment, validate_status_transition, PaymentMethod, PaymentStatus};
use ortho_core::types::{Cents, Date, DbId, Timestamp};
use ortho_db::models::payment::{CreatePayment, Payment, PaymentSummary, RecordPayment};
use ortho_db::repositories::{PaymentRepo, TreatmentPlanRepo};
use serde::Deserialize;
use validator::Validate;

use super::ensure_patient;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::middleware::validation::ValidatedJson;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /payments` (one-off charge).
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub patient_id: DbId,
    pub treatment_plan_id: Option<DbId>,
    #[validate(range(min = 1, message = "amount_cents must be positive"))]
    pub amount_cents: Cents,
    pub due_date: Option<Date>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Request body for `POST /payments/{id}/record`.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 1, message = "amount_cents must be positive"))]
    pub amount_cents: Cents,
    pub method: String,
    /// Defaults to now.
    pub paid_at: Option<Timestamp>,
}

/// Request body for `PUT /payments/{id}/status`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn payment_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Payment",
        id,
    })
}

/// The row changed between our read and the guarded write.
fn concurrent_change() -> AppError {
    AppError::Core(CoreError::Conflict(
        "Payment was modified concurrently; reload and try again".into(),
    ))
}

async fn find_payment(state: &AppState, id: DbId) -> AppResult<Payment> {
    PaymentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| payment_not_found(id))
}

/// POST /api/payments
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    ValidatedJson(input): ValidatedJson<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    if let Some(plan_id) = input.treatment_plan_id {
        let plan = TreatmentPlanRepo::find_by_id(&state.pool, plan_id).await?;
        if plan.is_some_and(|p| p.patient_id != input.patient_id) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Treatment plan {plan_id} belongs to a different patient"
            ))));
        }
    }

    let dto = CreatePayment {
        patient_id: input.patient_id,
        treatment_plan_id: input.treatment_plan_id,
        sequence: None,
        amount_cents: input.amount_cents,
        status: None,
        due_date: input.due_date,
        description: input.description,
        created_by: Some(user.user_id),
    };
    let payment = PaymentRepo::create(&state.pool, &dto).await?;

    tracing::info!(
        payment_id = payment.id,
        patient_id = payment.patient_id,
        amount_cents = payment.amount_cents,
        user_id = user.user_id,
        "Payment created"
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<Payment>> {
    Ok(Json(find_payment(&state, id).await?))
}

/// POST /api/payments/{id}/record
///
/// Applies received money. The payment becomes `PAID` once fully covered
/// and `PARTIAL` otherwise; overpayment is rejected. A concurrent recording
/// against the same payment yields 409 and must be retried.
pub async fn record(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<RecordPaymentRequest>,
) -> AppResult<Json<Payment>> {
    let method = PaymentMethod::parse(&input.method)?;
    let current = find_payment(&state, id).await?;
    let status = PaymentStatus::parse(&current.status)?;

    let applied = apply_payment(
        status,
        current.amount_cents,
        current.paid_cents,
        input.amount_cents,
    )?;

    let record = RecordPayment {
        paid_cents: applied.paid_cents,
        status: applied.status.as_str().to_string(),
        method: method.as_str().to_string(),
        paid_at: input.paid_at.unwrap_or_else(Utc::now),
    };
    let payment = PaymentRepo::record_payment(
        &state.pool,
        id,
        current.paid_cents,
        &current.status,
        &record,
    )
    .await?
    .ok_or_else(concurrent_change)?;

    tracing::info!(
        payment_id = id,
        received_cents = input.amount_cents,
        status = %payment.status,
        user_id = user.user_id,
        "Payment recorded"
    );
    Ok(Json(payment))
}

/// PUT /api/payments/{id}/status
///
/// Manual status changes. Money-bearing states (`PAID`, `PARTIAL`) are
/// reached through `/record`; cancelling and refunding require `ADMIN`.
/// A status changed by someone else since it was read yields 409.
pub async fn update_status(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<Payment>> {
    let next = PaymentStatus::parse(&input.status)?;
    if matches!(next, PaymentStatus::Paid | PaymentStatus::Partial) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Use the record endpoint to mark a payment {next}"
        ))));
    }
    if next.requires_admin() && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Admin role required to mark a payment {next}"
        ))));
    }

    let current = find_payment(&state, id).await?;
    validate_status_transition(PaymentStatus::parse(&current.status)?, next)?;

    let payment = PaymentRepo::update_status(&state.pool, id, &current.status, next.as_str())
        .await?
        .ok_or_else(concurrent_change)?;

    tracing::info!(
        payment_id = id,
        from = %current.status,
        to = %payment.status,
        user_id = user.user_id,
        "Payment status changed"
    );
    Ok(Json(payment))
}

/// GET /api/payments/overdue?limit=&offset=
pub async fn list_overdue(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    let (limit, offset) = params.resolve();
    let data = PaymentRepo::list_overdue(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/patients/{id}/payments
pub async fn list_for_patient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    ensure_patient(&state, patient_id).await?;
    let data = PaymentRepo::list_by_patient(&state.pool, patient_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/patients/{id}/payments/summary
pub async fn summary_for_patient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<PaymentSummary>> {
    ensure_patient(&state, patient_id).await?;
    let summary = PaymentRepo::summary_for_patient(&state.pool, patient_id).await?;
    Ok(Json(summary))
}
