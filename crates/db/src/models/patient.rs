//! Patient entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{Cents, Date, DbId, Timestamp};

/// A row from the `patients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Patient {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub normalized_phone: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub source: String,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a patient.
///
/// The repository normalizes `email` and derives `normalized_phone`, so
/// callers pass contact details exactly as entered.
#[derive(Debug, Clone, Default)]
pub struct CreatePatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    /// Defaults to `INTERNAL` when omitted.
    pub source: Option<String>,
    pub created_by: Option<DbId>,
}

/// DTO for updating a patient. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdatePatient {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

/// Aggregates shown on the patient detail page.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct PatientStats {
    pub treatment_plan_count: i64,
    pub active_treatment_count: i64,
    pub photo_count: i64,
    pub outstanding_cents: Cents,
    pub next_appointment_at: Option<Timestamp>,
}

/// Patient row plus its aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub stats: PatientStats,
}
