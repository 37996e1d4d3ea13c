//! Repository for the `clinical_notes` table.

use sqlx::PgPool;
use ortho_core::types::DbId;

use crate::models::clinical_note::{ClinicalNote, CreateClinicalNote, UpdateClinicalNote};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, patient_id, treatment_plan_id, author_id, category, content, created_at, updated_at";

/// Provides CRUD operations for clinical notes.
pub struct ClinicalNoteRepo;

impl ClinicalNoteRepo {
    /// Insert a new note. If `category` is `None`, defaults to `GENERAL`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateClinicalNote,
    ) -> Result<ClinicalNote, sqlx::Error> {
        let query = format!(
            "INSERT INTO clinical_notes (patient_id, treatment_plan_id, author_id, category, content)
             VALUES ($1, $2, $3, COALESCE($4, 'GENERAL'), $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClinicalNote>(&query)
            .bind(input.patient_id)
            .bind(input.treatment_plan_id)
            .bind(input.author_id)
            .bind(&input.category)
            .bind(&input.content)
            .fetch_one(pool)
            .await
    }

    /// Find a note by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ClinicalNote>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clinical_notes WHERE id = $1");
        sqlx::query_as::<_, ClinicalNote>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a patient's notes, newest first.
    pub async fn list_by_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<ClinicalNote>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clinical_notes
             WHERE patient_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ClinicalNote>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }

    /// Update a note. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateClinicalNote,
    ) -> Result<Option<ClinicalNote>, sqlx::Error> {
        let query = format!(
            "UPDATE clinical_notes SET
                category = COALESCE($2, category),
                content = COALESCE($3, content)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClinicalNote>(&query)
            .bind(id)
            .bind(&input.category)
            .bind(&input.content)
            .fetch_optional(pool)
            .await
    }

    /// Delete a note. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clinical_notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
