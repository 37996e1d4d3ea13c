//! Repository for the `legacy_sync_runs` table.

use sqlx::PgPool;
use ortho_core::types::{DbId, Timestamp};

use crate::models::legacy_sync_run::{FinishSyncRun, LegacySyncRun};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, status, started_at, finished_at, fetched, patients_created, \
                        patients_matched, appointments_created, appointments_updated, \
                        appointments_unchanged, retried, error_count, last_error, max_source_updated_at, \
                        triggered_by, created_at, updated_at";

/// Provides persistence for sync run history and the incremental watermark.
pub struct LegacySyncRunRepo;

impl LegacySyncRunRepo {
    /// Open a new run in `RUNNING` state.
    pub async fn start(
        pool: &PgPool,
        triggered_by: Option<DbId>,
    ) -> Result<LegacySyncRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO legacy_sync_runs (status, triggered_by)
             VALUES ('RUNNING', $1)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LegacySyncRun>(&query)
            .bind(triggered_by)
            .fetch_one(pool)
            .await
    }

    /// Close a run with its final status and counters.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        input: &FinishSyncRun,
    ) -> Result<LegacySyncRun, sqlx::Error> {
        let query = format!(
            "UPDATE legacy_sync_runs SET
                status = $2,
                finished_at = NOW(),
                fetched = $3,
                patients_created = $4,
                patients_matched = $5,
                appointments_created = $6,
                appointments_updated = $7,
                appointments_unchanged = $8,
                retried = $9,
                error_count = $10,
                last_error = $11,
                max_source_updated_at = $12
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LegacySyncRun>(&query)
            .bind(id)
            .bind(&input.status)
            .bind(input.fetched)
            .bind(input.patients_created)
            .bind(input.patients_matched)
            .bind(input.appointments_created)
            .bind(input.appointments_updated)
            .bind(input.appointments_unchanged)
            .bind(input.retried)
            .bind(input.error_count)
            .bind(&input.last_error)
            .bind(input.max_source_updated_at)
            .fetch_one(pool)
            .await
    }

    /// Watermark for the next incremental pass.
    ///
    /// Partial runs advance it too: their failed bookings are kept in
    /// `legacy_sync_failures` and retried by number.
    pub async fn last_watermark(pool: &PgPool) -> Result<Option<Timestamp>, sqlx::Error> {
        let watermark: Option<Option<Timestamp>> = sqlx::query_scalar(
            "SELECT max_source_updated_at FROM legacy_sync_runs
             WHERE status IN ('COMPLETED', 'PARTIAL') AND max_source_updated_at IS NOT NULL
             ORDER BY max_source_updated_at DESC
             LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        Ok(watermark.flatten())
    }

    /// Mark runs left `RUNNING` by a crashed process as `FAILED`.
    pub async fn fail_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE legacy_sync_runs
             SET status = 'FAILED', finished_at = NOW(), last_error = 'Interrupted'
             WHERE status = 'RUNNING'",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Most recent runs first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<LegacySyncRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM legacy_sync_runs ORDER BY started_at DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, LegacySyncRun>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
