//! Repository for the `photos` table.

use sqlx::PgPool;
use ortho_core::types::DbId;

use crate::models::photo::{CreatePhoto, Photo, UpdatePhoto};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, patient_id, treatment_plan_id, photo_type, storage_key, url, \
                        thumbnail_url, content_type, size_bytes, width, height, caption, \
                        taken_at, uploaded_by, created_at, updated_at";

/// Provides CRUD operations for photo metadata.
pub struct PhotoRepo;

impl PhotoRepo {
    /// Insert photo metadata after the image has been stored.
    pub async fn create(pool: &PgPool, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos (patient_id, treatment_plan_id, photo_type, storage_key, url,
                                 thumbnail_url, content_type, size_bytes, width, height,
                                 caption, taken_at, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(input.patient_id)
            .bind(input.treatment_plan_id)
            .bind(&input.photo_type)
            .bind(&input.storage_key)
            .bind(&input.url)
            .bind(&input.thumbnail_url)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.caption)
            .bind(input.taken_at)
            .bind(input.uploaded_by)
            .fetch_one(pool)
            .await
    }

    /// Find a photo by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photos WHERE id = $1");
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a patient's photos, optionally narrowed to one photo type.
    ///
    /// Ordered by capture time (upload time when unknown), newest first.
    pub async fn list_by_patient(
        pool: &PgPool,
        patient_id: DbId,
        photo_type: Option<&str>,
    ) -> Result<Vec<Photo>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM photos
             WHERE patient_id = $1 AND ($2::TEXT IS NULL OR photo_type = $2)
             ORDER BY COALESCE(taken_at, created_at) DESC, id DESC"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(patient_id)
            .bind(photo_type)
            .fetch_all(pool)
            .await
    }

    /// Update photo metadata. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePhoto,
    ) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!(
            "UPDATE photos SET
                treatment_plan_id = COALESCE($2, treatment_plan_id),
                photo_type = COALESCE($3, photo_type),
                caption = COALESCE($4, caption),
                taken_at = COALESCE($5, taken_at)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .bind(input.treatment_plan_id)
            .bind(&input.photo_type)
            .bind(&input.caption)
            .bind(input.taken_at)
            .fetch_optional(pool)
            .await
    }

    /// Delete photo metadata. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
