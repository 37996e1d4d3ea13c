//! HTTP-level integration tests for payments: creation, recording money,
//! manual status changes, overdue tracking, and patient balances.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, create_patient, get_auth, post_json_auth, put_json_auth, seed_staff};
use sqlx::PgPool;

async fn create_payment(pool: &PgPool, token: &str, patient_id: i64, amount: i64, due: &str) -> i64 {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/payments",
        token,
        serde_json::json!({
            "patient_id": patient_id,
            "amount_cents": amount,
            "due_date": due,
            "description": "Records and consultation",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

async fn record(pool: &PgPool, token: &str, payment_id: i64, amount: i64) -> axum::http::Response<axum::body::Body> {
    post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/payments/{payment_id}/record"),
        token,
        serde_json::json!({ "amount_cents": amount, "method": "CARD" }),
    )
    .await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_payment_defaults_to_pending(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Val", "Ruiz").await;
    let id = create_payment(&pool, &staff.assistant.token, patient, 15000, "2026-12-01").await;

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/payments/{id}"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["paid_cents"], 0);
    assert_eq!(json["created_by"], staff.assistant.user.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_payment_validation(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Wes", "Lund").await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/payments",
        &staff.assistant.token,
        serde_json::json!({ "patient_id": patient, "amount_cents": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["details"]["amount_cents"].is_array());

    let response = post_json_auth(
        build_test_app(pool),
        "/api/payments",
        &staff.assistant.token,
        serde_json::json!({ "patient_id": 999999, "amount_cents": 100 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_REFERENCE");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_record_partial_then_full(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Xia", "Wong").await;
    let id = create_payment(&pool, &staff.assistant.token, patient, 10000, "2026-12-01").await;

    let response = record(&pool, &staff.assistant.token, id, 4000).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "PARTIAL");
    assert_eq!(json["paid_cents"], 4000);
    assert_eq!(json["method"], "CARD");

    // Overpayment is refused.
    let response = record(&pool, &staff.assistant.token, id, 7000).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = record(&pool, &staff.assistant.token, id, 6000).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "PAID");
    assert_eq!(json["paid_cents"], 10000);
    assert!(json["paid_at"].is_string());

    // Nothing more can be recorded against a settled payment.
    let response = record(&pool, &staff.assistant.token, id, 1).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_record_rejects_unknown_method(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Yan", "Cole").await;
    let id = create_payment(&pool, &staff.assistant.token, patient, 10000, "2026-12-01").await;

    let response = post_json_auth(
        build_test_app(pool),
        &format!("/api/payments/{id}/record"),
        &staff.assistant.token,
        serde_json::json!({ "amount_cents": 100, "method": "BITCOIN" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_status_changes_respect_roles_and_lifecycle(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Zoe", "Hart").await;
    let id = create_payment(&pool, &staff.assistant.token, patient, 5000, "2026-12-01").await;
    let uri = format!("/api/payments/{id}/status");

    // Money-bearing states go through /record.
    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &staff.admin.token,
        serde_json::json!({ "status": "PAID" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &staff.assistant.token,
        serde_json::json!({ "status": "CANCELLED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &staff.admin.token,
        serde_json::json!({ "status": "CANCELLED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "CANCELLED");

    // Cancelled is terminal.
    let response = put_json_auth(
        build_test_app(pool),
        &uri,
        &staff.admin.token,
        serde_json::json!({ "status": "OVERDUE" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_refund_after_payment(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Ada", "Voss").await;
    let id = create_payment(&pool, &staff.assistant.token, patient, 2500, "2026-12-01").await;
    assert_eq!(record(&pool, &staff.assistant.token, id, 2500).await.status(), StatusCode::OK);

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/payments/{id}/status"),
        &staff.admin.token,
        serde_json::json!({ "status": "REFUNDED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "REFUNDED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_overdue_listing_and_patient_summary(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Bea", "Nash").await;
    let late = create_payment(&pool, &staff.assistant.token, patient, 3000, "2020-01-15").await;
    let paid = create_payment(&pool, &staff.assistant.token, patient, 2000, "2099-01-15").await;
    assert_eq!(record(&pool, &staff.assistant.token, paid, 500).await.status(), StatusCode::OK);

    let today = chrono::Utc::now().date_naive();
    let flagged = ortho_db::repositories::PaymentRepo::mark_overdue(&pool, today)
        .await
        .unwrap();
    assert_eq!(flagged, 1);

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/payments/overdue",
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let overdue = json["data"].as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["id"], late);

    // Overdue money can still be recorded.
    let response = record(&pool, &staff.assistant.token, late, 1000).await;
    assert_eq!(body_json(response).await["status"], "PARTIAL");

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/patients/{patient}/payments/summary"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["total_billed_cents"], 5000);
    assert_eq!(summary["total_paid_cents"], 1500);
    assert_eq!(summary["outstanding_cents"], 3500);
    assert_eq!(summary["open_count"], 2);

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/patients/{patient}/payments"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}
