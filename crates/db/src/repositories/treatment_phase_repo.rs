//! Repository for the `treatment_phases` table.
//!
//! Every lookup is scoped to its parent plan so a phase id from another
//! plan never resolves.

use sqlx::PgPool;
use ortho_core::types::DbId;

use crate::models::treatment::{CreateTreatmentPhase, TreatmentPhase, UpdateTreatmentPhase};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, treatment_plan_id, name, description, phase_order, status, \
                        start_date, end_date, created_at, updated_at";

/// Provides CRUD operations for treatment phases.
pub struct TreatmentPhaseRepo;

impl TreatmentPhaseRepo {
    /// Insert a new phase, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTreatmentPhase,
    ) -> Result<TreatmentPhase, sqlx::Error> {
        let query = format!(
            "INSERT INTO treatment_phases (treatment_plan_id, name, description, phase_order,
                                           status, start_date, end_date)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'PENDING'), $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TreatmentPhase>(&query)
            .bind(input.treatment_plan_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.phase_order)
            .bind(&input.status)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_one(pool)
            .await
    }

    /// Find a phase within a plan.
    pub async fn find_by_id(
        pool: &PgPool,
        plan_id: DbId,
        id: DbId,
    ) -> Result<Option<TreatmentPhase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM treatment_phases WHERE id = $1 AND treatment_plan_id = $2"
        );
        sqlx::query_as::<_, TreatmentPhase>(&query)
            .bind(id)
            .bind(plan_id)
            .fetch_optional(pool)
            .await
    }

    /// List a plan's phases in `phase_order`.
    pub async fn list_by_plan(
        pool: &PgPool,
        plan_id: DbId,
    ) -> Result<Vec<TreatmentPhase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM treatment_phases
             WHERE treatment_plan_id = $1
             ORDER BY phase_order ASC"
        );
        sqlx::query_as::<_, TreatmentPhase>(&query)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    /// Update a phase. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the phase does not exist within the plan.
    pub async fn update(
        pool: &PgPool,
        plan_id: DbId,
        id: DbId,
        input: &UpdateTreatmentPhase,
    ) -> Result<Option<TreatmentPhase>, sqlx::Error> {
        let query = format!(
            "UPDATE treatment_phases SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                phase_order = COALESCE($5, phase_order),
                status = COALESCE($6, status),
                start_date = COALESCE($7, start_date),
                end_date = COALESCE($8, end_date)
             WHERE id = $1 AND treatment_plan_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TreatmentPhase>(&query)
            .bind(id)
            .bind(plan_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.phase_order)
            .bind(&input.status)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete a phase. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, plan_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM treatment_phases WHERE id = $1 AND treatment_plan_id = $2")
                .bind(id)
                .bind(plan_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
