//! Repository for the seeded `roles` lookup table (ADMIN, DOCTOR, ASSISTANT).

use sqlx::PgPool;
use ortho_core::types::DbId;

use crate::models::role::Role;

pub struct RoleRepo;

impl RoleRepo {
    /// All roles in seed order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at, updated_at FROM roles ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// ID of the role called `name`, as stored on `users.role_id`.
    pub async fn id_for_name(pool: &PgPool, name: &str) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Name for a `users.role_id`. The foreign key guarantees the row exists.
    pub async fn name_for_id(pool: &PgPool, role_id: DbId) -> Result<String, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_one(pool)
            .await
    }

    /// Which of `expected` have no row. Checked at startup so a damaged
    /// lookup table fails fast instead of rejecting logins later.
    pub async fn missing(pool: &PgPool, expected: &[&str]) -> Result<Vec<String>, sqlx::Error> {
        let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        sqlx::query_scalar(
            "SELECT name FROM UNNEST($1::text[]) AS expected(name)
             WHERE NOT EXISTS (SELECT 1 FROM roles r WHERE r.name = expected.name)
             ORDER BY name",
        )
        .bind(&expected)
        .fetch_all(pool)
        .await
    }
}
