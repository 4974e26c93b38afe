mod common;

use axum::http::StatusCode;
use common::{create_test_course, register_user, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

async fn linking_code(pool: &PgPool, user_id: uuid::Uuid) -> String {
    sqlx::query_scalar("SELECT linking_code FROM students WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_links_child_and_sees_courses(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool.clone());
    let parent = register_user(&app, "parent").await;
    let child = register_user(&app, "student").await;

    send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&child.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;

    let code = linking_code(&pool, child.id).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/users/link-child",
        Some(&parent.access),
        Some(json!({ "linking_code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Child linked successfully.");
    assert_eq!(body["student"]["user"]["email"], child.email);

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/link-child",
        Some(&parent.access),
        Some(json!({ "linking_code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send(
        &app,
        "GET",
        "/api/users/parent/children-courses",
        Some(&parent.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_children"], 1);
    assert_eq!(body["total_enrollments"], 1);
    assert_eq!(body["total_active_enrollments"], 1);
    assert_eq!(body["children"][0]["child"]["email"], child.email);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_linking_code(pool: PgPool) {
    let app = setup_test_app(pool);
    let parent = register_user(&app, "parent").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/link-child",
        Some(&parent.access),
        Some(json!({ "linking_code": "NOPE0000" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid linking code.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_use_parent_endpoints(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/users/parent/children-courses",
        Some(&student.access),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only parents can access this endpoint.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_user_by_id(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/users/{}", student.id),
        Some(&student.access),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.to_string().contains(&student.email));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_superusers_can_become_admin(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;
    let uri = format!("/api/users/{}/update", student.id);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&student.access),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only superusers can have 'admin' role.");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&student.access),
        Some(json!({ "first_name": "Grace" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.to_string().contains("Grace"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_users_cannot_update_each_other(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;
    let other = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{}/update", other.id),
        Some(&student.access),
        Some(json!({ "first_name": "Mallory" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "You do not have permission to perform this action."
    );
}
