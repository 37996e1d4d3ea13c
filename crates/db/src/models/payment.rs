//! Payment model, DTOs, and per-patient balance summary.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{Cents, Date, DbId, Timestamp};

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub patient_id: DbId,
    pub treatment_plan_id: Option<DbId>,
    pub sequence: Option<i32>,
    pub amount_cents: Cents,
    pub paid_cents: Cents,
    pub status: String,
    pub method: Option<String>,
    pub due_date: Option<Date>,
    pub paid_at: Option<Timestamp>,
    pub description: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a payment (one-off or installment).
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub patient_id: DbId,
    pub treatment_plan_id: Option<DbId>,
    pub sequence: Option<i32>,
    pub amount_cents: Cents,
    /// Defaults to `PENDING` when omitted.
    pub status: Option<String>,
    pub due_date: Option<Date>,
    pub description: Option<String>,
    pub created_by: Option<DbId>,
}

/// Money recorded against a payment.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub paid_cents: Cents,
    pub status: String,
    pub method: String,
    pub paid_at: Timestamp,
}

/// Balance overview for one patient.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct PaymentSummary {
    pub total_billed_cents: Cents,
    pub total_paid_cents: Cents,
    pub outstanding_cents: Cents,
    pub overdue_cents: Cents,
    pub open_count: i64,
    pub overdue_count: i64,
}
