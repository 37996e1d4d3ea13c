/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (birth dates, due dates) carry no time zone.
pub type Date = chrono::NaiveDate;

/// Monetary amounts are stored as integer cents.
pub type Cents = i64;
