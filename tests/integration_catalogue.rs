mod common;

use axum::http::StatusCode;
use common::{
    create_admin, create_test_course, register_user, send, setup_state, setup_test_app,
};
use academy::router::init_router;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_creates_category_with_generated_slug(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&admin.access),
        Some(json!({ "name": "Web Development" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Web Development");
    assert_eq!(body["slug"], "web-development");
    assert_eq!(body["courses_count"], 0);

    let (status, body) = send(&app, "GET", "/api/categories/web-development", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Web Development");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_category_write_requires_admin(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = register_user(&app, "student").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        None,
        Some(json!({ "name": "Design" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&student.access),
        Some(json!({ "name": "Design" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_creates_course(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);

    let (_, category) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&admin.access),
        Some(json!({ "name": "Programming" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/courses",
        Some(&admin.access),
        Some(json!({
            "title": "Intro to Rust",
            "price": "15000.00",
            "is_published": true,
            "start_date": "2026-01-01",
            "end_date": "2026-03-31",
            "category_id": category["id"],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["title"], "Intro to Rust");
    assert_eq!(body["slug"], "intro-to-rust");
    assert_eq!(body["enrollment_count"], 0);

    let course_id = body["id"].as_str().unwrap();
    let (status, body) = send(&app, "GET", &format!("/api/courses/{}", course_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category_name"], "Programming");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_listing_filters_published(pool: PgPool) {
    let published = create_test_course(&pool, true).await;
    let draft = create_test_course(&pool, false).await;
    let app = setup_test_app(pool);

    let (status, body) = send(&app, "GET", "/api/courses?is_published=true", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert!(ids.contains(&published.to_string().as_str()));
    assert!(!ids.contains(&draft.to_string().as_str()));
    assert!(body["meta"]["total"].as_i64().unwrap() >= 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_course_is_not_found(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/courses/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_nested_lesson_and_quiz(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let course_id = create_test_course(&pool, true).await;
    let app = init_router(state);

    let (status, lesson) = send(
        &app,
        "POST",
        &format!("/api/courses/{}/lessons", course_id),
        Some(&admin.access),
        Some(json!({ "title": "Ownership", "order": 1, "is_published": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lesson}");
    assert_eq!(lesson["course_id"], course_id.to_string());
    assert_eq!(lesson["order"], 1);

    let lesson_id = lesson["id"].as_str().unwrap();
    let (status, quiz) = send(
        &app,
        "POST",
        &format!("/api/lessons/{}/quizzes", lesson_id),
        Some(&admin.access),
        Some(json!({ "title": "Borrowing basics", "passing_score": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{quiz}");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/courses/{}/lessons", course_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_quiz_attempt_lifecycle(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let course_id = create_test_course(&pool, true).await;
    let app = init_router(state);
    let student = register_user(&app, "student").await;

    let (status, quiz) = send(
        &app,
        "POST",
        "/api/quizzes",
        Some(&admin.access),
        Some(json!({ "course_id": course_id, "title": "Final exam", "passing_score": 70 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{quiz}");
    let attempts_uri = format!("/api/quizzes/{}/attempts", quiz["id"].as_str().unwrap());

    let (status, body) = send(&app, "POST", &attempts_uri, Some(&student.access), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "You must be enrolled in this course to attempt this quiz."
    );

    send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&student.access),
        Some(json!({ "course_id": course_id })),
    )
    .await;

    let (status, attempt) = send(&app, "POST", &attempts_uri, Some(&student.access), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED, "{attempt}");
    let complete_uri = format!(
        "/api/quiz-attempts/{}/complete",
        attempt["id"].as_str().unwrap()
    );

    let (status, body) = send(
        &app,
        "POST",
        &complete_uri,
        Some(&student.access),
        Some(json!({ "score": "70.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_passed"], true);
    assert!(body["completed_at"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        &complete_uri,
        Some(&student.access),
        Some(json!({ "score": "90.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This attempt has already been completed.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_listing_with_huge_page_is_empty(pool: PgPool) {
    create_test_course(&pool, true).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/courses?page={}", i64::MAX),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["meta"]["has_more"], false);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/categories?offset={}", i64::MAX),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_category_patch_is_not_allowed(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/categories/anything",
        Some(&admin.access),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body["error"],
        "PATCH method is not allowed. Use PUT for updates."
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_category_with_courses_cannot_be_deleted(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);

    let course_id = create_test_course(&pool, true).await;
    let slug: String = sqlx::query_scalar(
        "SELECT c.slug FROM categories c JOIN courses co ON co.category_id = c.id WHERE co.id = $1",
    )
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let uri = format!("/api/categories/{}", slug);
    let (status, body) = send(&app, "DELETE", &uri, Some(&admin.access), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Cannot delete category with existing courses. Please reassign or delete courses first."
    );

    sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(course_id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, _) = send(&app, "DELETE", &uri, Some(&admin.access), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
