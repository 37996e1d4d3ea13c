//! First-run administrator provisioning.
//!
//! Registration requires an `ADMIN` token, so an empty database needs one
//! account created out of band. When the `users` table is empty and both
//! `BOOTSTRAP_ADMIN_EMAIL` and `BOOTSTRAP_ADMIN_PASSWORD` are set, the server
//! creates that administrator at startup.

use ortho_core::error::CoreError;
use ortho_core::roles::{ROLE_ADMIN, VALID_ROLES};
use ortho_db::models::user::{CreateUser, User};
use ortho_db::repositories::{RoleRepo, UserRepo};
use sqlx::PgPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};

/// Credentials for the initial administrator.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl BootstrapAdmin {
    /// Read `BOOTSTRAP_ADMIN_EMAIL` / `BOOTSTRAP_ADMIN_PASSWORD`.
    /// Returns `None` unless both are set and non-blank.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?;
        let password = std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
        if email.trim().is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            email: email.trim().to_lowercase(),
            password,
        })
    }
}

/// Fail unless every clinic role is present in the `roles` lookup table.
pub async fn verify_roles(pool: &PgPool) -> AppResult<()> {
    let missing = RoleRepo::missing(pool, VALID_ROLES).await?;
    if !missing.is_empty() {
        return Err(AppError::InternalError(format!(
            "roles table is missing: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Create the administrator if no user exists yet.
///
/// Returns the created user, or `None` when users are already present.
pub async fn ensure_admin(pool: &PgPool, admin: &BootstrapAdmin) -> AppResult<Option<User>> {
    if UserRepo::count(pool).await? > 0 {
        return Ok(None);
    }

    validate_password_strength(&admin.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role_id = RoleRepo::id_for_name(pool, ROLE_ADMIN)
        .await?
        .ok_or_else(|| AppError::InternalError("ADMIN role is missing".into()))?;

    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: admin.email.clone(),
            password_hash,
            first_name: "System".into(),
            last_name: "Administrator".into(),
            role_id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, email = %user.email, "Bootstrap administrator created");
    Ok(Some(user))
}
