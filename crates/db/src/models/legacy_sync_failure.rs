//! Legacy bookings waiting to be retried.

use serde::Serialize;
use sqlx::FromRow;
use ortho_core::types::{DbId, Timestamp};

/// A row from the `legacy_sync_failures` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LegacySyncFailure {
    pub id: DbId,
    pub booking_number: String,
    /// Legacy `updated_at` of the version that last failed.
    pub source_updated_at: Timestamp,
    pub attempts: i32,
    pub last_error: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
