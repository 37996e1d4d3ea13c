//! [`BookingSource`] reading the legacy MySQL `bookings` table.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions};
use sqlx::{FromRow, QueryBuilder};
use ortho_core::types::Timestamp;

use crate::error::SyncError;
use crate::source::{BookingSource, LegacyBooking};

/// Raw row shape. Numeric booking numbers and durations are cast in SQL so
/// the legacy column types do not leak into Rust.
#[derive(Debug, FromRow)]
struct BookingRow {
    booking_number: String,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    starts_at: Timestamp,
    duration_minutes: Option<i64>,
    service: Option<String>,
    status: Option<String>,
    notes: Option<String>,
    updated_at: Timestamp,
}

impl From<BookingRow> for LegacyBooking {
    fn from(row: BookingRow) -> Self {
        Self {
            booking_number: row.booking_number,
            first_name: row.first_name,
            last_name: row.last_name,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            starts_at: row.starts_at,
            duration_minutes: row.duration_minutes.and_then(|d| i32::try_from(d).ok()),
            service: row.service,
            status: row.status.unwrap_or_default(),
            notes: row.notes,
            updated_at: row.updated_at,
        }
    }
}

const BOOKING_COLUMNS: &str = "SELECT
        CAST(booking_number AS CHAR) AS booking_number,
        first_name, last_name, full_name, email, phone,
        starts_at,
        CAST(duration_minutes AS SIGNED) AS duration_minutes,
        service, status, notes, updated_at
     FROM bookings";

/// Reads bookings from the legacy MySQL database.
pub struct MySqlBookingSource {
    pool: MySqlPool,
    batch_limit: i64,
}

impl MySqlBookingSource {
    /// Build a lazily connected source; no connection is made until the first fetch.
    pub fn connect_lazy(database_url: &str, batch_limit: i64) -> Result<Self, SyncError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(database_url)
            .map_err(|e| SyncError::Source(e.to_string()))?;
        Ok(Self { pool, batch_limit })
    }
}

#[async_trait]
impl BookingSource for MySqlBookingSource {
    async fn fetch_updated_since(
        &self,
        since: Option<Timestamp>,
    ) -> Result<Vec<LegacyBooking>, SyncError> {
        let query = format!(
            "{BOOKING_COLUMNS}
             WHERE (? IS NULL OR updated_at >= ?)
             ORDER BY updated_at ASC, booking_number ASC
             LIMIT ?"
        );
        let rows = sqlx::query_as::<_, BookingRow>(&query)
            .bind(since)
            .bind(since)
            .bind(self.batch_limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SyncError::Source(e.to_string()))?;
        Ok(rows.into_iter().map(LegacyBooking::from).collect())
    }

    async fn fetch_by_booking_numbers(
        &self,
        booking_numbers: &[String],
    ) -> Result<Vec<LegacyBooking>, SyncError> {
        if booking_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<MySql>::new(BOOKING_COLUMNS);
        builder.push(" WHERE CAST(booking_number AS CHAR) IN (");
        let mut list = builder.separated(", ");
        for number in booking_numbers {
            list.push_bind(number.as_str());
        }
        list.push_unseparated(") ORDER BY updated_at ASC, booking_number ASC");

        let rows = builder
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SyncError::Source(e.to_string()))?;
        Ok(rows.into_iter().map(LegacyBooking::from).collect())
    }
}
