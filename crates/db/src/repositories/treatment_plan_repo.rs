//! Repository for the `treatment_plans` table.

use sqlx::PgPool;
use ortho_core::types::DbId;

use crate::models::treatment::{CreateTreatmentPlan, TreatmentPlan, UpdateTreatmentPlan};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, patient_id, doctor_id, title, treatment_type, status, description, \
                        start_date, estimated_end_date, actual_end_date, total_cost_cents, \
                        created_at, updated_at";

/// Provides CRUD operations for treatment plans.
pub struct TreatmentPlanRepo;

impl TreatmentPlanRepo {
    /// Insert a new plan, returning the created row.
    ///
    /// If `status` is `None`, defaults to `PLANNED`; a missing cost becomes 0.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTreatmentPlan,
    ) -> Result<TreatmentPlan, sqlx::Error> {
        let query = format!(
            "INSERT INTO treatment_plans (patient_id, doctor_id, title, treatment_type, status,
                                          description, start_date, estimated_end_date,
                                          total_cost_cents)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'PLANNED'), $6, $7, $8, COALESCE($9, 0))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TreatmentPlan>(&query)
            .bind(input.patient_id)
            .bind(input.doctor_id)
            .bind(&input.title)
            .bind(&input.treatment_type)
            .bind(&input.status)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.estimated_end_date)
            .bind(input.total_cost_cents)
            .fetch_one(pool)
            .await
    }

    /// Find a plan by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TreatmentPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM treatment_plans WHERE id = $1");
        sqlx::query_as::<_, TreatmentPlan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a patient's plans, newest first.
    pub async fn list_by_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<TreatmentPlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM treatment_plans
             WHERE patient_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, TreatmentPlan>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }

    /// Update a plan. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTreatmentPlan,
    ) -> Result<Option<TreatmentPlan>, sqlx::Error> {
        let query = format!(
            "UPDATE treatment_plans SET
                doctor_id = COALESCE($2, doctor_id),
                title = COALESCE($3, title),
                treatment_type = COALESCE($4, treatment_type),
                status = COALESCE($5, status),
                description = COALESCE($6, description),
                start_date = COALESCE($7, start_date),
                estimated_end_date = COALESCE($8, estimated_end_date),
                actual_end_date = COALESCE($9, actual_end_date),
                total_cost_cents = COALESCE($10, total_cost_cents)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TreatmentPlan>(&query)
            .bind(id)
            .bind(input.doctor_id)
            .bind(&input.title)
            .bind(&input.treatment_type)
            .bind(&input.status)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.estimated_end_date)
            .bind(input.actual_end_date)
            .bind(input.total_cost_cents)
            .fetch_optional(pool)
            .await
    }

    /// Delete a plan and (by cascade) its phases. Returns `true` if a row was removed.
    ///
    /// Fails with a foreign key violation while payments reference the plan.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM treatment_plans WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
