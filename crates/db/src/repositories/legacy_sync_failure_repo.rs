//! Repository for the `legacy_sync_failures` table.

use sqlx::PgPool;
use ortho_core::types::Timestamp;

use crate::models::legacy_sync_failure::LegacySyncFailure;

const COLUMNS: &str = "id, booking_number, source_updated_at, attempts, last_error, \
                        created_at, updated_at";

/// Tracks bookings that failed to import so later passes can retry them.
pub struct LegacySyncFailureRepo;

impl LegacySyncFailureRepo {
    /// Record a failed import, bumping `attempts` if the booking failed before.
    pub async fn record(
        pool: &PgPool,
        booking_number: &str,
        source_updated_at: Timestamp,
        error: &str,
    ) -> Result<LegacySyncFailure, sqlx::Error> {
        let query = format!(
            "INSERT INTO legacy_sync_failures (booking_number, source_updated_at, last_error)
             VALUES ($1, $2, $3)
             ON CONFLICT (booking_number) DO UPDATE SET
                attempts = legacy_sync_failures.attempts + 1,
                source_updated_at = EXCLUDED.source_updated_at,
                last_error = EXCLUDED.last_error
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LegacySyncFailure>(&query)
            .bind(booking_number)
            .bind(source_updated_at)
            .bind(error)
            .fetch_one(pool)
            .await
    }

    /// Forget a booking once it imported or disappeared upstream.
    pub async fn clear(pool: &PgPool, booking_number: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM legacy_sync_failures WHERE booking_number = $1")
            .bind(booking_number)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Oldest failures first.
    pub async fn list_pending(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<LegacySyncFailure>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM legacy_sync_failures
             ORDER BY source_updated_at ASC, id ASC
             LIMIT $1"
        );
        sqlx::query_as::<_, LegacySyncFailure>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
