/// Errors raised while synchronizing legacy bookings.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Failure in the clinic's own database.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The legacy system could not be read.
    #[error("Legacy source unavailable: {0}")]
    Source(String),

    /// Another pass holds the sync lock.
    #[error("A legacy sync pass is already running")]
    AlreadyRunning,

    /// Legacy sync is not configured on this server.
    #[error("Legacy sync is not configured")]
    NotConfigured,
}
