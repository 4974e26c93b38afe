mod common;

use academy::router::init_router;
use axum::http::StatusCode;
use common::{
    create_admin, create_test_course, register_user, send, setup_state, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn test_review_requires_active_enrollment(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;
    let uri = format!("/api/courses/{}/reviews", course_id);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&student.access),
        Some(json!({ "rating": 5, "comment": "Great" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "You must be enrolled in this course to leave a review."
    );

    send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&student.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&student.access),
        Some(json!({ "rating": 5, "comment": "Great" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["rating"], 5);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&student.access),
        Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already reviewed this course.");

    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_review_rating_is_validated(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/reviews",
        Some(&student.access),
        Some(json!({ "course_id": course_id, "rating": 9 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_author_edits_review(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let author = register_user(&app, "student").await;
    let other = register_user(&app, "student").await;

    send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&author.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;
    let (_, review) = send(
        &app,
        "POST",
        "/api/reviews",
        Some(&author.access),
        Some(json!({ "course_id": course_id, "rating": 3 })),
    )
    .await;
    let uri = format!("/api/reviews/{}", review["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&other.access),
        Some(json!({ "rating": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only edit your own reviews.");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&author.access),
        Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 4);

    let (status, body) = send(&app, "DELETE", &uri, Some(&author.access), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only admins can delete reviews.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bookmarks(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;
    let other = register_user(&app, "student").await;

    let (status, bookmark) = send(
        &app,
        "POST",
        "/api/bookmarks",
        Some(&student.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{bookmark}");

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookmarks",
        Some(&student.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already bookmarked this course.");

    let uri = format!("/api/bookmarks/{}", bookmark["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, Some(&other.access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&student.access), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/api/bookmarks", Some(&student.access), None).await;
    assert_eq!(body["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_cannot_bookmark(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let app = setup_test_app(pool);
    let parent = register_user(&app, "parent").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookmarks",
        Some(&parent.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only students can bookmark courses.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_issues_certificate(pool: PgPool) {
    let course_id = create_test_course(&pool, true).await;
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);
    let student = register_user(&app, "student").await;
    let body = json!({ "user_id": student.id, "course_id": course_id });

    let (status, _) = send(
        &app,
        "POST",
        "/api/certificates",
        Some(&student.access),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, certificate) = send(
        &app,
        "POST",
        "/api/certificates",
        Some(&admin.access),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{certificate}");
    assert!(
        certificate["certificate_id"]
            .as_str()
            .unwrap()
            .starts_with("CERT-")
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/certificates",
        Some(&admin.access),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "A certificate has already been issued for this course."
    );

    let (status, body) = send(&app, "GET", "/api/certificates", Some(&student.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_notifications_read_flow(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);
    let student = register_user(&app, "student").await;

    let (status, _) = send(
        &app,
        "GET",
        "/api/notifications/unread_count",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "POST",
        "/api/notifications/bulk",
        Some(&admin.access),
        Some(json!({
            "user_ids": [student.id, Uuid::new_v4()],
            "notification_type": "course_update",
            "title": "New module",
            "message": "A new module is live.",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], 1);
    assert_eq!(body["failed"], 1);

    let (status, body) = send(&app, "GET", "/api/notifications", Some(&student.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    let id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/notifications/{}", id),
        Some(&admin.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/notifications/{}/mark_read", id),
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, _) = send(
        &app,
        "GET",
        "/api/notifications/unread_count",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_notify_requires_admin(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/notifications/bulk",
        Some(&student.access),
        Some(json!({
            "user_ids": [student.id],
            "notification_type": "system",
            "title": "Hi",
            "message": "Hello",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_notification_preferences(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/notification-preferences",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_enrollment"], true);
    assert_eq!(body["email_marketing"], false);

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/notification-preferences",
        Some(&student.access),
        Some(json!({ "email_enrollment": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_enrollment"], false);
    assert_eq!(body["email_payment"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_all_read(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);
    let student = register_user(&app, "student").await;

    for title in ["First", "Second"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/notifications/bulk",
            Some(&admin.access),
            Some(json!({
                "user_ids": [student.id],
                "notification_type": "system",
                "title": title,
                "message": "Heads up.",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = send(
        &app,
        "GET",
        "/api/notifications/unread_count",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/notifications/mark_all_read",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success", "updated": 2 }));

    let (status, _) = send(
        &app,
        "GET",
        "/api/notifications/unread_count",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &app,
        "POST",
        "/api/notifications/mark_all_read",
        Some(&student.access),
        None,
    )
    .await;
    assert_eq!(body["updated"], 0);
}
