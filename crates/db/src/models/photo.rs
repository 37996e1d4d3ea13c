//! Patient photo metadata model and DTOs.
//!
//! Image bytes live in the configured image store; this table only keeps
//! the object key, public URLs, and descriptive metadata.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{DbId, Timestamp};

/// A row from the `photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: DbId,
    pub patient_id: DbId,
    pub treatment_plan_id: Option<DbId>,
    pub photo_type: String,
    pub storage_key: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub caption: Option<String>,
    pub taken_at: Option<Timestamp>,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording an uploaded photo.
#[derive(Debug, Clone)]
pub struct CreatePhoto {
    pub patient_id: DbId,
    pub treatment_plan_id: Option<DbId>,
    pub photo_type: String,
    pub storage_key: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub caption: Option<String>,
    pub taken_at: Option<Timestamp>,
    pub uploaded_by: Option<DbId>,
}

/// DTO for editing photo metadata. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdatePhoto {
    pub treatment_plan_id: Option<DbId>,
    pub photo_type: Option<String>,
    pub caption: Option<String>,
    pub taken_at: Option<Timestamp>,
}
