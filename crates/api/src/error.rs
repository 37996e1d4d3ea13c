use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ortho_core::error::CoreError;
use ortho_core::types::DbId;
use ortho_media::MediaError;
use ortho_sync::SyncError;
use serde_json::json;

use crate::middleware::validation::field_errors;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and the storage and sync errors of
/// the side integrations. Renders as `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Media(#[from] MediaError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Request body failed its `validator` rules.
    #[error("Validation failed: {0}")]
    Validation(validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A request field names a row that does not exist. Same response as a
    /// foreign-key violation on insert.
    #[error("{entity} {id} does not exist")]
    InvalidReference { entity: &'static str, id: DbId },

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String);

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Media(err) => classify_media_error(err),
            AppError::Sync(err) => classify_sync_error(err),

            AppError::Validation(errors) => {
                details = Some(field_errors(errors));
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Request body failed validation".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InvalidReference { .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_REFERENCE",
                self.to_string(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = match details {
            Some(details) => json!({ "error": message, "code": code, "details": details }),
            None => json!({ "error": message, "code": code }),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on `uq_*` constraints map to 409.
/// - Foreign-key violations map to 409 when deleting a referenced row and
///   400 when inserting or updating a row that points at a missing one.
/// - Check violations map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some("23505") if constraint.starts_with("uq_") => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                ),
                Some("23503") if db_err.message().starts_with("update or delete") => (
                    StatusCode::CONFLICT,
                    "REFERENCE_CONFLICT",
                    format!("Record is still referenced by other records ({constraint})"),
                ),
                Some("23503") => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_REFERENCE",
                    format!("Referenced record does not exist ({constraint})"),
                ),
                Some("23514") => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    format!("Value violates check constraint: {constraint}"),
                ),
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    internal()
                }
            }
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

fn classify_media_error(err: &MediaError) -> Classified {
    match err {
        MediaError::InvalidImage(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        MediaError::Http(_) | MediaError::Upstream { .. } | MediaError::Io(_) => {
            tracing::error!(error = %err, "Image storage failure");
            (
                StatusCode::BAD_GATEWAY,
                "STORAGE_ERROR",
                "Image storage is unavailable".to_string(),
            )
        }
        MediaError::InvalidKey(_) | MediaError::Config(_) => {
            tracing::error!(error = %err, "Image storage misuse");
            internal()
        }
    }
}

fn classify_sync_error(err: &SyncError) -> Classified {
    match err {
        SyncError::AlreadyRunning => (StatusCode::CONFLICT, "CONFLICT", err.to_string()),
        SyncError::NotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SYNC_DISABLED",
            "Legacy sync is not configured on this server".to_string(),
        ),
        SyncError::Source(msg) => {
            tracing::warn!(error = %msg, "Legacy source unavailable");
            (
                StatusCode::BAD_GATEWAY,
                "SYNC_SOURCE_ERROR",
                "Legacy booking system is unavailable".to_string(),
            )
        }
        SyncError::Database(db) => classify_sqlx_error(db),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_errors_map_to_gateway_statuses() {
        let (status, code, _) = classify_sync_error(&SyncError::Source("down".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "SYNC_SOURCE_ERROR");
        let (status, _, _) = classify_sync_error(&SyncError::AlreadyRunning);
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _, _) = classify_sync_error(&SyncError::NotConfigured);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn media_upstream_is_bad_gateway() {
        let err = MediaError::Upstream {
            status: 500,
            body: "boom".into(),
        };
        let (status, code, message) = classify_media_error(&err);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "STORAGE_ERROR");
        assert!(!message.contains("boom"));
    }

    #[test]
    fn row_not_found_is_404() {
        let (status, code, _) = classify_sqlx_error(&sqlx::Error::RowNotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }
}
