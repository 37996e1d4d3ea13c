//! HTTP-level integration tests for treatment plans, phases, and
//! installment schedules.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_patient, delete_auth, get_auth, post_json_auth,
    put_json_auth, seed_staff, Staff,
};
use sqlx::PgPool;

async fn create_plan(pool: &PgPool, staff: &Staff, patient_id: i64) -> i64 {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/treatments",
        &staff.doctor.token,
        serde_json::json!({
            "patient_id": patient_id,
            "title": "Full upper and lower braces",
            "treatment_type": "BRACES",
            "start_date": "2026-01-10",
            "estimated_end_date": "2027-07-10",
            "total_cost_cents": 480000,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

async fn set_status(pool: &PgPool, staff: &Staff, plan_id: i64, status: &str) -> StatusCode {
    put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/treatments/{plan_id}"),
        &staff.doctor.token,
        serde_json::json!({ "status": status }),
    )
    .await
    .status()
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_doctor_creates_plan_for_self(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Mia", "Chen").await;
    let plan_id = create_plan(&pool, &staff, patient).await;

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/treatments/{plan_id}"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "PLANNED");
    assert_eq!(json["doctor_id"], staff.doctor.user.id);
    assert_eq!(json["patient_id"], patient);
    assert!(json["phases"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_assistant_cannot_create_plan(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Noa", "Levi").await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/treatments",
        &staff.assistant.token,
        serde_json::json!({ "patient_id": patient, "title": "Aligners", "treatment_type": "CLEAR_ALIGNERS" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_plan_rejects_bad_input(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Oli", "Berg").await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/treatments",
        &staff.doctor.token,
        serde_json::json!({ "patient_id": 999999, "title": "Retainer", "treatment_type": "RETAINER" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_REFERENCE");

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/treatments",
        &staff.doctor.token,
        serde_json::json!({
            "patient_id": patient,
            "title": "Expander",
            "treatment_type": "EXPANDER",
            "start_date": "2026-05-01",
            "estimated_end_date": "2026-01-01",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        build_test_app(pool),
        "/api/treatments",
        &staff.doctor.token,
        serde_json::json!({ "patient_id": patient, "title": "Mystery", "treatment_type": "MAGIC" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_plan_status_lifecycle(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Pia", "Holm").await;
    let plan_id = create_plan(&pool, &staff, patient).await;

    // PLANNED cannot jump straight to COMPLETED.
    assert_eq!(set_status(&pool, &staff, plan_id, "COMPLETED").await, StatusCode::BAD_REQUEST);
    assert_eq!(set_status(&pool, &staff, plan_id, "ACTIVE").await, StatusCode::OK);
    assert_eq!(set_status(&pool, &staff, plan_id, "ON_HOLD").await, StatusCode::OK);
    assert_eq!(set_status(&pool, &staff, plan_id, "ACTIVE").await, StatusCode::OK);
    assert_eq!(set_status(&pool, &staff, plan_id, "COMPLETED").await, StatusCode::OK);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/treatments/{plan_id}"),
        &staff.doctor.token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["status"], "COMPLETED");
    assert!(json["actual_end_date"].is_string());

    // Completed plans are read-only.
    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/treatments/{plan_id}"),
        &staff.doctor.token,
        serde_json::json!({ "title": "Renamed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_plans_for_patient(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Quinn", "Ames").await;
    create_plan(&pool, &staff, patient).await;
    create_plan(&pool, &staff, patient).await;

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/patients/{patient}/treatments"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_phase_crud_and_unique_order(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Rae", "Diaz").await;
    let plan_id = create_plan(&pool, &staff, patient).await;
    let phases_uri = format!("/api/treatments/{plan_id}/phases");

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &phases_uri,
        &staff.doctor.token,
        serde_json::json!({ "name": "Leveling and alignment", "phase_order": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let phase = body_json(response).await;
    let phase_id = phase["id"].as_i64().unwrap();
    assert_eq!(phase["status"], "PENDING");

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &phases_uri,
        &staff.doctor.token,
        serde_json::json!({ "name": "Duplicate slot", "phase_order": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("{phases_uri}/{phase_id}"),
        &staff.doctor.token,
        serde_json::json!({ "status": "IN_PROGRESS", "start_date": "2026-02-01" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "IN_PROGRESS");

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("{phases_uri}/{phase_id}"),
        &staff.assistant.token,
        serde_json::json!({ "status": "COMPLETED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("{phases_uri}/{phase_id}"),
        &staff.doctor.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(build_test_app(pool), &phases_uri, &staff.assistant.token).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Payment plan
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_payment_plan_generation(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Sam", "Ito").await;
    let plan_id = create_plan(&pool, &staff, patient).await;
    let uri = format!("/api/treatments/{plan_id}/payment-plan");
    let body = serde_json::json!({
        "total_cents": 100000,
        "down_payment_cents": 20000,
        "installment_count": 3,
        "first_due_date": "2026-03-01",
    });

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &staff.assistant.token,
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let payments = json["data"].as_array().unwrap();
    assert_eq!(payments.len(), 4);

    let total: i64 = payments.iter().map(|p| p["amount_cents"].as_i64().unwrap()).sum();
    assert_eq!(total, 100000);
    assert_eq!(payments[0]["description"], "Down payment");
    assert_eq!(payments[0]["due_date"], "2026-03-01");
    assert_eq!(payments[1]["amount_cents"], 26667);
    assert_eq!(payments[1]["due_date"], "2026-04-01");
    assert_eq!(payments[3]["description"], "Installment 3 of 3");
    assert!(payments.iter().all(|p| p["status"] == "PENDING"));

    // A second schedule for the same plan is refused.
    let response = post_json_auth(build_test_app(pool.clone()), &uri, &staff.assistant.token, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/treatments/{plan_id}/payments"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 4);

    // Plans with payments cannot be deleted.
    let response = delete_auth(
        build_test_app(pool),
        &format!("/api/treatments/{plan_id}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_concurrent_payment_plans_create_one_schedule(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Rui", "Lane").await;
    let plan_id = create_plan(&pool, &staff, patient).await;
    let uri = format!("/api/treatments/{plan_id}/payment-plan");
    let body = serde_json::json!({
        "total_cents": 90000,
        "installment_count": 3,
        "first_due_date": "2026-03-01",
    });

    let (first, second) = tokio::join!(
        post_json_auth(
            build_test_app(pool.clone()),
            &uri,
            &staff.assistant.token,
            body.clone(),
        ),
        post_json_auth(
            build_test_app(pool.clone()),
            &uri,
            &staff.doctor.token,
            body,
        ),
    );
    let mut statuses = vec![first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/treatments/{plan_id}/payments"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_payment_plan_rejects_impossible_split(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Tia", "Moss").await;
    let plan_id = create_plan(&pool, &staff, patient).await;

    let response = post_json_auth(
        build_test_app(pool),
        &format!("/api/treatments/{plan_id}/payment-plan"),
        &staff.assistant.token,
        serde_json::json!({
            "total_cents": 500,
            "down_payment_cents": 600,
            "installment_count": 2,
            "first_due_date": "2026-03-01",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_deletes_plan_without_payments(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Uma", "Frey").await;
    let plan_id = create_plan(&pool, &staff, patient).await;

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/treatments/{plan_id}"),
        &staff.doctor.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/treatments/{plan_id}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/treatments/{plan_id}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
