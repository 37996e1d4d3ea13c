//! Legacy booking sync run history.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{DbId, Timestamp};

/// A row from the `legacy_sync_runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LegacySyncRun {
    pub id: DbId,
    pub status: String,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub fetched: i32,
    pub patients_created: i32,
    pub patients_matched: i32,
    pub appointments_created: i32,
    pub appointments_updated: i32,
    pub appointments_unchanged: i32,
    /// Earlier failures re-read in this run.
    pub retried: i32,
    pub error_count: i32,
    pub last_error: Option<String>,
    pub max_source_updated_at: Option<Timestamp>,
    pub triggered_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Final counters written when a run ends.
#[derive(Debug, Clone, Default)]
pub struct FinishSyncRun {
    pub status: String,
    pub fetched: i32,
    pub patients_created: i32,
    pub patients_matched: i32,
    pub appointments_created: i32,
    pub appointments_updated: i32,
    pub appointments_unchanged: i32,
    /// Earlier failures re-read in this run.
    pub retried: i32,
    pub error_count: i32,
    pub last_error: Option<String>,
    pub max_source_updated_at: Option<Timestamp>,
}
