//! Query parameter types shared across handler modules.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Clamped with `ortho_db::clamp_limit` / `clamp_offset` before use.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)` pair.
    pub fn resolve(&self) -> (i64, i64) {
        (
            ortho_db::clamp_limit(self.limit),
            ortho_db::clamp_offset(self.offset),
        )
    }
}
