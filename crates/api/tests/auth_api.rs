//! HTTP-level integration tests for the auth and admin endpoints.
//!
//! Tests cover login, token refresh, logout, role enforcement, password
//! changes, account lockout, and admin user management.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_test_user, delete_auth, get, get_auth, post_json,
    post_json_auth, put_json_auth, seed_staff, TEST_PASSWORD,
};
use sqlx::PgPool;
use tower::ServiceExt;

async fn login(pool: &PgPool, email: &str, password: &str) -> axum::http::Response<axum::body::Body> {
    post_json(
        build_test_app(pool.clone()),
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Login / refresh / logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let doctor = create_test_user(&pool, "dr.ortiz@clinic.test", "DOCTOR").await;

    let response = login(&pool, "dr.ortiz@clinic.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["id"], doctor.user.id);
    assert_eq!(json["user"]["role"], "DOCTOR");
    assert!(json["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_wrong_password_and_unknown_email(pool: PgPool) {
    create_test_user(&pool, "front@clinic.test", "ASSISTANT").await;

    let response = login(&pool, "front@clinic.test", "not-the-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&pool, "ghost@clinic.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_inactive_user_is_forbidden(pool: PgPool) {
    let user = create_test_user(&pool, "gone@clinic.test", "ASSISTANT").await;
    ortho_db::repositories::UserRepo::deactivate(&pool, user.user.id)
        .await
        .unwrap();

    let response = login(&pool, "gone@clinic.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_account_locks_after_five_failures(pool: PgPool) {
    create_test_user(&pool, "typo@clinic.test", "ASSISTANT").await;

    for _ in 0..5 {
        let response = login(&pool, "typo@clinic.test", "wrong-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let response = login(&pool, "typo@clinic.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_rotates_and_old_token_is_rejected(pool: PgPool) {
    create_test_user(&pool, "rot@clinic.test", "DOCTOR").await;
    let json = body_json(login(&pool, "rot@clinic.test", TEST_PASSWORD).await).await;
    let original = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": original }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = body_json(response).await;
    assert_ne!(refreshed["refresh_token"].as_str().unwrap(), original);

    let response = post_json(
        build_test_app(pool),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": original }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_replayed_refresh_token_revokes_all_sessions(pool: PgPool) {
    create_test_user(&pool, "leak@clinic.test", "DOCTOR").await;
    let json = body_json(login(&pool, "leak@clinic.test", TEST_PASSWORD).await).await;
    let original = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": original }),
    )
    .await;
    let rotated = body_json(response).await["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    // Someone replays the rotated-out token.
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": original }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The legitimate holder's newer token is gone too.
    let response = post_json(
        build_test_app(pool),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": rotated }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_sessions_record_client(pool: PgPool) {
    create_test_user(&pool, "desk@clinic.test", "ASSISTANT").await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("user-agent", "FrontDeskTablet/3.2")
        .header("x-forwarded-for", "203.0.113.20, 10.0.0.1")
        .body(axum::body::Body::from(
            serde_json::json!({ "email": "desk@clinic.test", "password": TEST_PASSWORD })
                .to_string(),
        ))
        .unwrap();
    let response = build_test_app(pool.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let access = body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get_auth(build_test_app(pool), "/api/auth/sessions", &access).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let sessions = json["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["user_agent"], "FrontDeskTablet/3.2");
    assert_eq!(sessions[0]["ip_address"], "203.0.113.20");
    assert!(sessions[0].get("refresh_token_hash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_logout_revokes_refresh_tokens(pool: PgPool) {
    create_test_user(&pool, "bye@clinic.test", "DOCTOR").await;
    let json = body_json(login(&pool, "bye@clinic.test", TEST_PASSWORD).await).await;
    let access = json["access_token"].as_str().unwrap();
    let refresh = json["refresh_token"].as_str().unwrap();

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/auth/logout",
        access,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        build_test_app(pool),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_me_requires_token(pool: PgPool) {
    let staff = seed_staff(&pool).await;

    let response = get(build_test_app(pool.clone()), "/api/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(build_test_app(pool), "/api/auth/me", &staff.assistant.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["email"], "assistant@clinic.test");
    assert_eq!(json["role"], "ASSISTANT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_change_password(pool: PgPool) {
    let user = create_test_user(&pool, "pw@clinic.test", "DOCTOR").await;

    let response = put_json_auth(
        build_test_app(pool.clone()),
        "/api/auth/me/password",
        &user.token,
        serde_json::json!({ "current_password": "wrong", "new_password": "new-password-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        "/api/auth/me/password",
        &user.token,
        serde_json::json!({ "current_password": TEST_PASSWORD, "new_password": "short" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        "/api/auth/me/password",
        &user.token,
        serde_json::json!({ "current_password": TEST_PASSWORD, "new_password": "new-password-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        login(&pool, "pw@clinic.test", TEST_PASSWORD).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        login(&pool, "pw@clinic.test", "new-password-1").await.status(),
        StatusCode::OK
    );
}

// ---------------------------------------------------------------------------
// Registration and RBAC
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_requires_admin(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let body = serde_json::json!({
        "email": "new.assistant@clinic.test",
        "password": "welcome-aboard",
        "first_name": "Nia",
        "last_name": "Reyes",
        "role": "ASSISTANT",
    });

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/auth/register",
        &staff.doctor.token,
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/auth/register",
        &staff.admin.token,
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["role"], "ASSISTANT");
    assert!(json.get("password_hash").is_none());

    // Same email again.
    let response = post_json_auth(
        build_test_app(pool),
        "/api/auth/register",
        &staff.admin.token,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_validates_body(pool: PgPool) {
    let staff = seed_staff(&pool).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/auth/register",
        &staff.admin.token,
        serde_json::json!({
            "email": "not-an-email",
            "password": "short",
            "first_name": "",
            "last_name": "X",
            "role": "ASSISTANT",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["details"]["email"].is_array());
    assert!(json["details"]["password"].is_array());

    let response = post_json_auth(
        build_test_app(pool),
        "/api/auth/register",
        &staff.admin.token,
        serde_json::json!({
            "email": "who@clinic.test",
            "password": "long-enough-pw",
            "first_name": "A",
            "last_name": "B",
            "role": "JANITOR",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_lists_and_updates_users(pool: PgPool) {
    let staff = seed_staff(&pool).await;

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/admin/users",
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(build_test_app(pool.clone()), "/api/admin/users", &staff.admin.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let id = staff.assistant.user.id;
    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/admin/users/{id}"),
        &staff.admin.token,
        serde_json::json!({ "role": "DOCTOR", "last_name": "Promoted" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["role"], "DOCTOR");
    assert_eq!(json["last_name"], "Promoted");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_cannot_deactivate_self(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let me = staff.admin.user.id;

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/admin/users/{me}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let other = staff.assistant.user.id;
    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/admin/users/{other}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        login(&pool, "assistant@clinic.test", TEST_PASSWORD).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_reset_password(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let id = staff.doctor.user.id;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/admin/users/{id}/reset-password"),
        &staff.admin.token,
        serde_json::json!({ "new_password": "temporary-pass" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        login(&pool, "doctor@clinic.test", "temporary-pass").await.status(),
        StatusCode::OK
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_bootstrap_admin_only_on_empty_database(pool: PgPool) {
    use ortho_api::bootstrap::{ensure_admin, BootstrapAdmin};

    let admin = BootstrapAdmin {
        email: "owner@clinic.test".into(),
        password: "first-admin-pass".into(),
    };
    let created = ensure_admin(&pool, &admin).await.unwrap();
    assert!(created.is_some());
    assert!(ensure_admin(&pool, &admin).await.unwrap().is_none());

    assert_eq!(
        login(&pool, "owner@clinic.test", "first-admin-pass").await.status(),
        StatusCode::OK
    );
}
