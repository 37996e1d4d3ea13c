//! Repository for the `appointments` table.

use sqlx::PgPool;
use ortho_core::types::DbId;

use crate::models::appointment::{
    Appointment, AppointmentFilter, CreateAppointment, UpdateAppointment,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, patient_id, doctor_id, starts_at, duration_minutes, status, \
                        appointment_type, notes, source, legacy_booking_number, \
                        legacy_updated_at, created_at, updated_at";

/// Provides CRUD operations for appointments.
pub struct AppointmentRepo;

impl AppointmentRepo {
    /// Insert a new appointment.
    ///
    /// `status` defaults to `SCHEDULED` and `source` to `INTERNAL`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAppointment,
    ) -> Result<Appointment, sqlx::Error> {
        let query = format!(
            "INSERT INTO appointments (patient_id, doctor_id, starts_at, duration_minutes, status,
                                       appointment_type, notes, source, legacy_booking_number,
                                       legacy_updated_at)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'SCHEDULED'), $6, $7,
                     COALESCE($8, 'INTERNAL'), $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(input.patient_id)
            .bind(input.doctor_id)
            .bind(input.starts_at)
            .bind(input.duration_minutes)
            .bind(&input.status)
            .bind(&input.appointment_type)
            .bind(&input.notes)
            .bind(&input.source)
            .bind(&input.legacy_booking_number)
            .bind(input.legacy_updated_at)
            .fetch_one(pool)
            .await
    }

    /// Find an appointment by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM appointments WHERE id = $1");
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the appointment imported from a given legacy booking.
    pub async fn find_by_legacy_booking_number(
        pool: &PgPool,
        booking_number: &str,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM appointments WHERE legacy_booking_number = $1");
        sqlx::query_as::<_, Appointment>(&query)
            .bind(booking_number)
            .fetch_optional(pool)
            .await
    }

    /// List appointments matching `filter`, earliest first.
    ///
    /// `from` is inclusive and `to` exclusive on `starts_at`.
    pub async fn list(
        pool: &PgPool,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM appointments
             WHERE ($1::TIMESTAMPTZ IS NULL OR starts_at >= $1)
               AND ($2::TIMESTAMPTZ IS NULL OR starts_at < $2)
               AND ($3::BIGINT IS NULL OR patient_id = $3)
               AND ($4::BIGINT IS NULL OR doctor_id = $4)
               AND ($5::TEXT IS NULL OR status = $5)
             ORDER BY starts_at ASC, id ASC
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.patient_id)
            .bind(filter.doctor_id)
            .bind(&filter.status)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Update an appointment. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAppointment,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET
                doctor_id = COALESCE($2, doctor_id),
                starts_at = COALESCE($3, starts_at),
                duration_minutes = COALESCE($4, duration_minutes),
                status = COALESCE($5, status),
                appointment_type = COALESCE($6, appointment_type),
                notes = COALESCE($7, notes),
                legacy_updated_at = COALESCE($8, legacy_updated_at)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(input.doctor_id)
            .bind(input.starts_at)
            .bind(input.duration_minutes)
            .bind(&input.status)
            .bind(&input.appointment_type)
            .bind(&input.notes)
            .bind(input.legacy_updated_at)
            .fetch_optional(pool)
            .await
    }

    /// Delete an appointment. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
