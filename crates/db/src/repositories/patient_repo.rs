//! Repository for the `patients` table.

use sqlx::PgPool;
use ortho_core::contact::{normalize_email, normalize_phone};
use ortho_core::types::DbId;

use crate::models::patient::{CreatePatient, Patient, PatientStats, UpdatePatient};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, first_name, last_name, date_of_birth, gender, email, phone, \
                        normalized_phone, address, guardian_name, medical_history, allergies, \
                        source, created_by, created_at, updated_at";

/// Shared search predicate. `$1` is an ILIKE pattern, `$2` a digits-only
/// LIKE pattern for phone matching; either may be NULL.
const SEARCH_PREDICATE: &str = "($1::TEXT IS NULL
        OR first_name ILIKE $1
        OR last_name ILIKE $1
        OR (first_name || ' ' || last_name) ILIKE $1
        OR email ILIKE $1
        OR ($2::TEXT IS NOT NULL AND normalized_phone LIKE $2))";

/// Escape LIKE metacharacters and wrap the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Build the `($1, $2)` search parameters from a raw search term.
fn search_params(search: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) else {
        return (None, None);
    };
    let digits: String = term.chars().filter(char::is_ascii_digit).collect();
    let phone = (digits.len() >= 3).then(|| format!("%{digits}%"));
    (Some(like_pattern(term)), phone)
}

/// Provides CRUD and lookup operations for patients.
pub struct PatientRepo;

impl PatientRepo {
    /// Insert a new patient, returning the created row.
    ///
    /// Email is stored normalized and `normalized_phone` is derived from `phone`.
    /// If `source` is `None`, defaults to `INTERNAL`.
    pub async fn create(pool: &PgPool, input: &CreatePatient) -> Result<Patient, sqlx::Error> {
        let query = format!(
            "INSERT INTO patients (first_name, last_name, date_of_birth, gender, email, phone,
                                   normalized_phone, address, guardian_name, medical_history,
                                   allergies, source, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, COALESCE($12, 'INTERNAL'), $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Patient>(&query)
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .bind(input.date_of_birth)
            .bind(&input.gender)
            .bind(input.email.as_deref().and_then(normalize_email))
            .bind(&input.phone)
            .bind(input.phone.as_deref().and_then(normalize_phone))
            .bind(&input.address)
            .bind(&input.guardian_name)
            .bind(&input.medical_history)
            .bind(&input.allergies)
            .bind(&input.source)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a patient by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Patient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE id = $1");
        sqlx::query_as::<_, Patient>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Search patients by name, email, or phone digits.
    ///
    /// Returns one page ordered by last name plus the total number of matches.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Patient>, i64), sqlx::Error> {
        let (pattern, phone) = search_params(search);

        let query = format!(
            "SELECT {COLUMNS} FROM patients
             WHERE {SEARCH_PREDICATE}
             ORDER BY last_name ASC, first_name ASC, id ASC
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, Patient>(&query)
            .bind(&pattern)
            .bind(&phone)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        let count_query = format!("SELECT COUNT(*) FROM patients WHERE {SEARCH_PREDICATE}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(&pattern)
            .bind(&phone)
            .fetch_one(pool)
            .await?;

        Ok((rows, total))
    }

    /// Update a patient. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePatient,
    ) -> Result<Option<Patient>, sqlx::Error> {
        let query = format!(
            "UPDATE patients SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                date_of_birth = COALESCE($4, date_of_birth),
                gender = COALESCE($5, gender),
                email = COALESCE($6, email),
                phone = COALESCE($7, phone),
                normalized_phone = CASE WHEN $7::TEXT IS NULL THEN normalized_phone ELSE $8 END,
                address = COALESCE($9, address),
                guardian_name = COALESCE($10, guardian_name),
                medical_history = COALESCE($11, medical_history),
                allergies = COALESCE($12, allergies)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Patient>(&query)
            .bind(id)
            .bind(input.first_name.as_deref().map(str::trim))
            .bind(input.last_name.as_deref().map(str::trim))
            .bind(input.date_of_birth)
            .bind(&input.gender)
            .bind(input.email.as_deref().and_then(normalize_email))
            .bind(&input.phone)
            .bind(input.phone.as_deref().and_then(normalize_phone))
            .bind(&input.address)
            .bind(&input.guardian_name)
            .bind(&input.medical_history)
            .bind(&input.allergies)
            .fetch_optional(pool)
            .await
    }

    /// Delete a patient. Returns `true` if a row was removed.
    ///
    /// Fails with a foreign key violation while treatment plans, photos,
    /// payments, notes, or appointments still reference the patient.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Aggregate counters for the patient detail view.
    pub async fn stats(pool: &PgPool, id: DbId) -> Result<PatientStats, sqlx::Error> {
        sqlx::query_as::<_, PatientStats>(
            "SELECT
                (SELECT COUNT(*) FROM treatment_plans WHERE patient_id = $1)
                    AS treatment_plan_count,
                (SELECT COUNT(*) FROM treatment_plans WHERE patient_id = $1 AND status = 'ACTIVE')
                    AS active_treatment_count,
                (SELECT COUNT(*) FROM photos WHERE patient_id = $1)
                    AS photo_count,
                (SELECT COALESCE(SUM(amount_cents - paid_cents), 0)::BIGINT FROM payments
                  WHERE patient_id = $1 AND status IN ('PENDING', 'PARTIAL', 'OVERDUE'))
                    AS outstanding_cents,
                (SELECT MIN(starts_at) FROM appointments
                  WHERE patient_id = $1 AND starts_at >= NOW()
                    AND status IN ('SCHEDULED', 'CONFIRMED'))
                    AS next_appointment_at",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Find the patient owning a normalized email address.
    pub async fn find_by_normalized_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Patient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE email = $1");
        sqlx::query_as::<_, Patient>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find the oldest patient with the given digits-only phone number.
    pub async fn find_by_normalized_phone(
        pool: &PgPool,
        phone: &str,
    ) -> Result<Option<Patient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM patients WHERE normalized_phone = $1 ORDER BY id ASC LIMIT 1"
        );
        sqlx::query_as::<_, Patient>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }
}
