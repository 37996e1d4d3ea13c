//! Treatment plan and treatment phase models and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{Cents, Date, DbId, Timestamp};

/// A row from the `treatment_plans` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TreatmentPlan {
    pub id: DbId,
    pub patient_id: DbId,
    pub doctor_id: Option<DbId>,
    pub title: String,
    pub treatment_type: String,
    pub status: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub total_cost_cents: Cents,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a treatment plan.
#[derive(Debug, Clone)]
pub struct CreateTreatmentPlan {
    pub patient_id: DbId,
    pub doctor_id: Option<DbId>,
    pub title: String,
    pub treatment_type: String,
    /// Defaults to `PLANNED` when omitted.
    pub status: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub total_cost_cents: Option<Cents>,
}

/// DTO for updating a treatment plan. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateTreatmentPlan {
    pub doctor_id: Option<DbId>,
    pub title: Option<String>,
    pub treatment_type: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub total_cost_cents: Option<Cents>,
}

/// A row from the `treatment_phases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TreatmentPhase {
    pub id: DbId,
    pub treatment_plan_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub phase_order: i32,
    pub status: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a treatment phase.
#[derive(Debug, Clone)]
pub struct CreateTreatmentPhase {
    pub treatment_plan_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub phase_order: i32,
    /// Defaults to `PENDING` when omitted.
    pub status: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// DTO for updating a treatment phase. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateTreatmentPhase {
    pub name: Option<String>,
    pub description: Option<String>,
    pub phase_order: Option<i32>,
    pub status: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// A plan with its ordered phases, as returned by `GET /treatments/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentPlanDetail {
    #[serde(flatten)]
    pub plan: TreatmentPlan,
    pub phases: Vec<TreatmentPhase>,
}
