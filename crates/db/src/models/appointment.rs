//! Appointment model, DTOs, and list filter.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{DbId, Timestamp};

/// A row from the `appointments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Appointment {
    pub id: DbId,
    pub patient_id: DbId,
    pub doctor_id: Option<DbId>,
    pub starts_at: Timestamp,
    pub duration_minutes: i32,
    pub status: String,
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
    pub source: String,
    pub legacy_booking_number: Option<String>,
    pub legacy_updated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an appointment.
#[derive(Debug, Clone)]
pub struct CreateAppointment {
    pub patient_id: DbId,
    pub doctor_id: Option<DbId>,
    pub starts_at: Timestamp,
    pub duration_minutes: i32,
    /// Defaults to `SCHEDULED` when omitted.
    pub status: Option<String>,
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
    /// Defaults to `INTERNAL` when omitted.
    pub source: Option<String>,
    pub legacy_booking_number: Option<String>,
    pub legacy_updated_at: Option<Timestamp>,
}

/// DTO for updating an appointment. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateAppointment {
    pub doctor_id: Option<DbId>,
    pub starts_at: Option<Timestamp>,
    pub duration_minutes: Option<i32>,
    pub status: Option<String>,
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
    pub legacy_updated_at: Option<Timestamp>,
}

/// Optional filters for listing appointments.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub patient_id: Option<DbId>,
    pub doctor_id: Option<DbId>,
    pub status: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
