//! HTTP-level integration tests for patients and their clinical notes.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_patient, delete_auth, get_auth, post_json_auth,
    put_json_auth, seed_staff,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Patient CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_patient_returns_201(pool: PgPool) {
    let staff = seed_staff(&pool).await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/patients",
        &staff.assistant.token,
        serde_json::json!({
            "first_name": "Lucia",
            "last_name": "Mendez",
            "date_of_birth": "2012-04-09",
            "email": "lucia.parent@example.com",
            "phone": "(555) 010-2233",
            "guardian_name": "Rosa Mendez",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["id"].is_number());
    assert_eq!(json["first_name"], "Lucia");
    assert_eq!(json["source"], "INTERNAL");
    assert_eq!(json["created_by"], staff.assistant.user.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_patient_validation(pool: PgPool) {
    let staff = seed_staff(&pool).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/patients",
        &staff.assistant.token,
        serde_json::json!({ "first_name": "  ", "last_name": "Blank" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/patients",
        &staff.assistant.token,
        serde_json::json!({ "first_name": "Tom", "last_name": "Future", "date_of_birth": "2999-01-01" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json_auth(
        build_test_app(pool),
        "/api/patients",
        &staff.assistant.token,
        serde_json::json!({ "first_name": "Tom", "last_name": "Phone", "phone": "12" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_patients_require_authentication(pool: PgPool) {
    let response = common::get(build_test_app(pool), "/api/patients").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_and_search_patients(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let token = &staff.assistant.token;
    create_patient(&pool, token, "Ana", "Lopez").await;
    create_patient(&pool, token, "Ben", "Kim").await;
    create_patient(&pool, token, "Carla", "Lopezova").await;

    let response = get_auth(build_test_app(pool.clone()), "/api/patients", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/patients?search=lopez",
        token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);

    let response = get_auth(build_test_app(pool), "/api/patients?limit=1&offset=1", token).await;
    let json = body_json(response).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_patient_includes_stats(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let id = create_patient(&pool, &staff.assistant.token, "Dana", "Ortiz").await;

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/patients/{id}"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], id);
    assert_eq!(json["stats"]["treatment_plan_count"], 0);
    assert_eq!(json["stats"]["outstanding_cents"], 0);

    let response = get_auth(
        build_test_app(pool),
        "/api/patients/999999",
        &staff.assistant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_patient(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let id = create_patient(&pool, &staff.assistant.token, "Eli", "Stone").await;

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/patients/{id}"),
        &staff.doctor.token,
        serde_json::json!({ "allergies": "Latex", "last_name": "Stone-Ray" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["allergies"], "Latex");
    assert_eq!(json["last_name"], "Stone-Ray");
    assert_eq!(json["first_name"], "Eli");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_patient_is_admin_only_and_guarded(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let free = create_patient(&pool, &staff.assistant.token, "Free", "Record").await;
    let charted = create_patient(&pool, &staff.assistant.token, "Has", "Notes").await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/patients/{charted}/notes"),
        &staff.doctor.token,
        serde_json::json!({ "content": "Initial consult", "category": "CLINICAL" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/patients/{free}"),
        &staff.doctor.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/patients/{free}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(
        build_test_app(pool),
        &format!("/api/patients/{charted}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "REFERENCE_CONFLICT");
}

// ---------------------------------------------------------------------------
// Clinical notes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_notes_are_editable_by_author_or_admin(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Ivy", "Park").await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/patients/{patient}/notes"),
        &staff.doctor.token,
        serde_json::json!({ "content": "Upper arch wire changed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let note = body_json(response).await;
    let note_id = note["id"].as_i64().unwrap();
    assert_eq!(note["category"], "GENERAL");
    assert_eq!(note["author_id"], staff.doctor.user.id);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/notes/{note_id}"),
        &staff.assistant.token,
        serde_json::json!({ "content": "Edited by someone else" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/notes/{note_id}"),
        &staff.doctor.token,
        serde_json::json!({ "content": "Upper and lower wires changed", "category": "TREATMENT" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["category"], "TREATMENT");

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/patients/{patient}/notes"),
        &staff.assistant.token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = delete_auth(
        build_test_app(pool),
        &format!("/api/notes/{note_id}"),
        &staff.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_blank_note_is_rejected(pool: PgPool) {
    let staff = seed_staff(&pool).await;
    let patient = create_patient(&pool, &staff.assistant.token, "Jo", "March").await;

    let response = post_json_auth(
        build_test_app(pool),
        &format!("/api/patients/{patient}/notes"),
        &staff.doctor.token,
        serde_json::json!({ "content": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
