//! Clinical note model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{DbId, Timestamp};

/// A row from the `clinical_notes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClinicalNote {
    pub id: DbId,
    pub patient_id: DbId,
    pub treatment_plan_id: Option<DbId>,
    pub author_id: DbId,
    pub category: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a note.
#[derive(Debug, Clone)]
pub struct CreateClinicalNote {
    pub patient_id: DbId,
    pub treatment_plan_id: Option<DbId>,
    pub author_id: DbId,
    /// Defaults to `GENERAL` when omitted.
    pub category: Option<String>,
    pub content: String,
}

/// DTO for editing a note. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateClinicalNote {
    pub category: Option<String>,
    pub content: Option<String>,
}
