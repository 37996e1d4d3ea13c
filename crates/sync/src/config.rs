/// Legacy sync configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LegacySyncConfig {
    /// MySQL URL of the legacy booking database. Sync is disabled when unset.
    pub database_url: Option<String>,
    /// Seconds between background passes.
    pub interval_secs: u64,
    /// Most bookings read in one pass.
    pub batch_limit: i64,
}

impl LegacySyncConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `LEGACY_DATABASE_URL`       | unset   |
    /// | `LEGACY_SYNC_INTERVAL_SECS` | `300`   |
    /// | `LEGACY_SYNC_BATCH_LIMIT`   | `5000`  |
    pub fn from_env() -> Self {
        let database_url = std::env::var("LEGACY_DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let interval_secs: u64 = std::env::var("LEGACY_SYNC_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("LEGACY_SYNC_INTERVAL_SECS must be a valid u64");

        let batch_limit: i64 = std::env::var("LEGACY_SYNC_BATCH_LIMIT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("LEGACY_SYNC_BATCH_LIMIT must be a valid i64");

        Self {
            database_url,
            interval_secs,
            batch_limit,
        }
    }
}
