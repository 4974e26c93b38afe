mod common;

use academy::router::init_router;
use axum::http::StatusCode;
use common::{
    create_admin, create_test_course, register_user, send, setup_state, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_student_enrolls_in_published_course(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool.clone());
    let student = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&student.access),
        Some(json!({ "course_id": course_id, "enrollment_notes": "Excited" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["course_id"], course_id.to_string());
    assert_eq!(body["user_id"], student.id.to_string());
    assert_eq!(body["status"], "active");
    assert_eq!(body["is_completed"], false);
    assert_eq!(body["student_email"], student.email);

    let count: i32 = sqlx::query_scalar("SELECT enrollment_count FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Enrolling leaves an in-app notification behind
    let (status, body) = send(
        &app,
        "GET",
        "/api/notifications/unread_count",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_enrollment_is_rejected(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;
    let uri = format!("/api/courses/{}/enrollments", course_id);

    let (status, _) = send(&app, "POST", &uri, Some(&student.access), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", &uri, Some(&student.access), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You are already enrolled in this course.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unpublished_course_cannot_be_enrolled(pool: PgPool) {
    let course_id = create_test_course(&pool, false).await;
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&student.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This course is not available for enrollment.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_cannot_enroll(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let parent = register_user(&app, "parent").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&parent.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only students can enroll in courses.");

    let (status, _) = send(
        &app,
        "GET",
        "/api/enrollments/my_enrollments",
        Some(&parent.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_requires_course_id(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&student.access),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "course_id is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_drop_enrollment(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool.clone());
    let student = register_user(&app, "student").await;

    let (_, enrollment) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&student.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;
    let drop_uri = format!("/api/enrollments/{}/drop", enrollment["id"].as_str().unwrap());

    let (status, body) = send(&app, "POST", &drop_uri, Some(&student.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Course dropped successfully.");

    let (status, body) = send(&app, "POST", &drop_uri, Some(&student.access), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot drop a dropped enrollment.");

    let count: i32 = sqlx::query_scalar("SELECT enrollment_count FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollments_are_private_to_their_student(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);
    let owner = register_user(&app, "student").await;
    let other = register_user(&app, "student").await;

    let (_, enrollment) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&owner.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;
    let uri = format!("/api/enrollments/{}", enrollment["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &uri, Some(&other.access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &uri, Some(&admin.access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/enrollments", Some(&other.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/students/{}/enrollments", owner.id),
        Some(&admin.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_progress_update_bounds(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (_, enrollment) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&student.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;
    let uri = format!("/api/enrollments/{}", enrollment["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&student.access),
        Some(json!({ "progress_percentage": "120" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Progress percentage must be between 0 and 100.");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&student.access),
        Some(json!({ "progress_percentage": "100", "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_completed"], true);
    assert!(body["completed_at"].is_string());
}
