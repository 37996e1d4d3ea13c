#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use ortho_api::auth::jwt::{generate_access_token, JwtConfig};
use ortho_api::auth::password::hash_password;
use ortho_api::config::{ServerConfig, DEFAULT_BODY_LIMIT_BYTES};
use ortho_api::router::build_app_router;
use ortho_api::state::AppState;
use ortho_db::models::user::{CreateUser, User};
use ortho_db::repositories::{RoleRepo, UserRepo};
use ortho_media::{LocalImageStore, MediaConfig};
use ortho_sync::{LegacySyncConfig, SyncEngine};

pub const TEST_PASSWORD: &str = "braces-and-bands-42";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry_mins: 15,
        refresh_token_expiry_days: 7,
    }
}

/// Build a test `ServerConfig` whose local image store lives in `media_root`.
pub fn test_config(media_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        shutdown_timeout_secs: 5,
        jwt: test_jwt_config(),
        media: MediaConfig::local(media_root, "http://localhost:3000/media"),
        legacy_sync: LegacySyncConfig {
            database_url: None,
            interval_secs: 300,
            batch_limit: 100,
        },
    }
}

/// Per-process scratch directory for tests that never read stored files.
fn scratch_media_root() -> PathBuf {
    std::env::temp_dir()
        .join("ortho-api-tests")
        .join(uuid::Uuid::new_v4().to_string())
}

/// Build the full application router with legacy sync disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app(pool, &scratch_media_root(), None)
}

/// Build the full application router with an explicit media root and an
/// optional sync engine.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_app(pool: PgPool, media_root: &Path, sync_engine: Option<Arc<SyncEngine>>) -> Router {
    let config = test_config(media_root);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        image_store: Arc::new(LocalImageStore::new(
            &config.media.local_root,
            &config.media.public_base_url,
        )),
        sync_engine,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

/// A persisted user together with a valid access token.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

/// Create a user with `role` (`ADMIN`, `DOCTOR`, `ASSISTANT`) and
/// [`TEST_PASSWORD`], and sign an access token for them.
pub async fn create_test_user(pool: &PgPool, email: &str, role: &str) -> TestUser {
    let role_id = RoleRepo::id_for_name(pool, role)
        .await
        .expect("role lookup should succeed")
        .expect("seeded role must exist");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            first_name: "Test".to_string(),
            last_name: role.to_string(),
            role_id,
        },
    )
    .await
    .expect("user creation should succeed");
    let token = generate_access_token(user.id, role, &test_jwt_config())
        .expect("token signing should succeed");
    TestUser { user, token }
}

/// One account per role.
pub struct Staff {
    pub admin: TestUser,
    pub doctor: TestUser,
    pub assistant: TestUser,
}

pub async fn seed_staff(pool: &PgPool) -> Staff {
    Staff {
        admin: create_test_user(pool, "admin@clinic.test", "ADMIN").await,
        doctor: create_test_user(pool, "doctor@clinic.test", "DOCTOR").await,
        assistant: create_test_user(pool, "assistant@clinic.test", "ASSISTANT").await,
    }
}

/// Create a patient through the API and return its id.
pub async fn create_patient(pool: &PgPool, token: &str, first: &str, last: &str) -> i64 {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/patients",
        token,
        serde_json::json!({ "first_name": first, "last_name": last }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, empty_request("GET", uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("GET", uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("POST", uri, None, body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, json_request("POST", uri, Some(token), body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, json_request("PUT", uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("DELETE", uri, Some(token))).await
}

/// Send a raw body with an explicit content type (used for multipart).
pub async fn post_raw_auth(
    app: Router,
    uri: &str,
    token: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
