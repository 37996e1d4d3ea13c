//! Repository for the `payments` table.

use sqlx::PgPool;
use ortho_core::types::{Date, DbId};

use crate::models::payment::{CreatePayment, Payment, PaymentSummary, RecordPayment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, patient_id, treatment_plan_id, sequence, amount_cents, paid_cents, \
                        status, method, due_date, paid_at, description, created_by, \
                        created_at, updated_at";

/// Provides CRUD and ledger operations for payments.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Insert a single payment. If `status` is `None`, defaults to `PENDING`.
    pub async fn create(pool: &PgPool, input: &CreatePayment) -> Result<Payment, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut *conn, input).await
    }

    /// Insert a plan's installment schedule atomically.
    ///
    /// The plan row is locked for the duration of the transaction and the
    /// schedule is only written while the plan has no non-cancelled
    /// payments. Returns `None` when it already has some, so two concurrent
    /// requests cannot both create a schedule.
    pub async fn create_schedule(
        pool: &PgPool,
        plan_id: DbId,
        inputs: &[CreatePayment],
    ) -> Result<Option<Vec<Payment>>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT id FROM treatment_plans WHERE id = $1 FOR UPDATE")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payments WHERE treatment_plan_id = $1 AND status <> 'CANCELLED'",
        )
        .bind(plan_id)
        .fetch_one(&mut *tx)
        .await?;
        if active > 0 {
            return Ok(None);
        }

        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            created.push(Self::insert(&mut *tx, input).await?);
        }
        tx.commit().await?;
        Ok(Some(created))
    }

    async fn insert(
        conn: &mut sqlx::PgConnection,
        input: &CreatePayment,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (patient_id, treatment_plan_id, sequence, amount_cents, status,
                                   due_date, description, created_by)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'PENDING'), $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(input.patient_id)
            .bind(input.treatment_plan_id)
            .bind(input.sequence)
            .bind(input.amount_cents)
            .bind(&input.status)
            .bind(input.due_date)
            .bind(&input.description)
            .bind(input.created_by)
            .fetch_one(conn)
            .await
    }

    /// Find a payment by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a patient's payments by due date (undated last), then schedule order.
    pub async fn list_by_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments
             WHERE patient_id = $1
             ORDER BY due_date ASC NULLS LAST, sequence ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }

    /// List the payments attached to a treatment plan in schedule order.
    pub async fn list_by_plan(pool: &PgPool, plan_id: DbId) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments
             WHERE treatment_plan_id = $1
             ORDER BY sequence ASC NULLS LAST, due_date ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    /// Move a payment from `expected_status` to `status`.
    ///
    /// Returns `None` when the row is missing or no longer has
    /// `expected_status`, e.g. after a concurrent cancel or recording.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        status: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET status = $3 WHERE id = $1 AND status = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(expected_status)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Write the result of a received payment.
    ///
    /// The update only applies while both `paid_cents` and `status` still
    /// hold the values the new balance was computed from. Two concurrent
    /// recordings cannot both add to the same starting balance, and a
    /// payment cancelled in the meantime is left alone. Returns `None` when
    /// the row is missing or was changed.
    pub async fn record_payment(
        pool: &PgPool,
        id: DbId,
        expected_paid_cents: i64,
        expected_status: &str,
        input: &RecordPayment,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET
                paid_cents = $4,
                status = $5,
                method = $6,
                paid_at = $7
             WHERE id = $1 AND paid_cents = $2 AND status = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(expected_paid_cents)
            .bind(expected_status)
            .bind(input.paid_cents)
            .bind(&input.status)
            .bind(&input.method)
            .bind(input.paid_at)
            .fetch_optional(pool)
            .await
    }

    /// Flag open payments whose due date is before `today` as `OVERDUE`.
    ///
    /// Returns the number of rows changed.
    pub async fn mark_overdue(pool: &PgPool, today: Date) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'OVERDUE'
             WHERE status IN ('PENDING', 'PARTIAL') AND due_date < $1",
        )
        .bind(today)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List overdue payments across all patients, oldest due date first.
    pub async fn list_overdue(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments
             WHERE status = 'OVERDUE'
             ORDER BY due_date ASC NULLS LAST, id ASC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Balance overview for one patient. Cancelled and refunded rows are
    /// excluded from the billed total.
    pub async fn summary_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<PaymentSummary, sqlx::Error> {
        sqlx::query_as::<_, PaymentSummary>(
            "SELECT
                COALESCE(SUM(amount_cents) FILTER (WHERE status NOT IN ('CANCELLED', 'REFUNDED')), 0)::BIGINT
                    AS total_billed_cents,
                COALESCE(SUM(paid_cents) FILTER (WHERE status NOT IN ('CANCELLED', 'REFUNDED')), 0)::BIGINT
                    AS total_paid_cents,
                COALESCE(SUM(amount_cents - paid_cents)
                    FILTER (WHERE status IN ('PENDING', 'PARTIAL', 'OVERDUE')), 0)::BIGINT
                    AS outstanding_cents,
                COALESCE(SUM(amount_cents - paid_cents) FILTER (WHERE status = 'OVERDUE'), 0)::BIGINT
                    AS overdue_cents,
                COUNT(*) FILTER (WHERE status IN ('PENDING', 'PARTIAL', 'OVERDUE'))
                    AS open_count,
                COUNT(*) FILTER (WHERE status = 'OVERDUE')
                    AS overdue_count
             FROM payments
             WHERE patient_id = $1",
        )
        .bind(patient_id)
        .fetch_one(pool)
        .await
    }
}
