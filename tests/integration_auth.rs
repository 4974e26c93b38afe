mod common;

use axum::http::StatusCode;
use academy::router::init_router;
use common::{
    TEST_PASSWORD, create_admin, generate_unique_email, register_user, send, setup_state,
    setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_register_student_returns_tokens(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let email = generate_unique_email();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email.to_uppercase(),
            "phone_number": "08012345678",
            "password": TEST_PASSWORD,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "student");
    assert_eq!(body["user"]["is_verified"], false);
    assert!(body["tokens"]["access"].is_string());
    assert!(body["tokens"]["refresh"].is_string());

    let students: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM students s JOIN users u ON u.id = s.user_id WHERE u.email = $1",
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(students, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_rejects_admin_role(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": generate_unique_email(),
            "phone_number": "08012345678",
            "password": TEST_PASSWORD,
            "role": "admin",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Regular users cannot have 'admin' role. Only superusers can be admins."
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_duplicate_email(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": user.email,
            "phone_number": "08012345678",
            "password": TEST_PASSWORD,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User with this email already exists.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_missing_field(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": generate_unique_email() })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_otp_marks_user_verified(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = register_user(&app, "student").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/verify-otp",
        None,
        Some(json!({ "email": user.email, "code": "000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/verify-otp",
        None,
        Some(json!({ "email": user.email, "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email verified successfully");

    let verified: bool = sqlx::query_scalar("SELECT is_verified FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(verified);

    // The code is single use
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/verify-otp",
        None,
        Some(json!({ "email": user.email, "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "parent").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": TEST_PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], user.email);
    assert_eq!(body["user"]["role"], "parent");
    assert!(body["tokens"]["access"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": "wrongpass" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_unknown_email(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@test.com", "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_invalid_email_format(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "not-an-email", "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_check_email_exists(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/check-email-exists",
        None,
        Some(json!({ "email": user.email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/check-email-exists",
        None,
        Some(json!({ "email": generate_unique_email() })),
    )
    .await;
    assert_eq!(body["exists"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_password_reset_flow(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/forget-password",
        None,
        Some(json!({ "email": user.email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "email": user.email,
            "code": "123456",
            "new_password": "newpass1234",
            "confirm_password": "different123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "email": user.email,
            "code": "123456",
            "new_password": "newpass1234",
            "confirm_password": "newpass1234",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": "newpass1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_rotates_and_logout_blacklists(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/token/refresh",
        None,
        Some(json!({ "refresh": user.refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());
    let rotated = body["refresh"].as_str().unwrap().to_string();

    // The old refresh token was consumed by the rotation
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token/refresh",
        None,
        Some(json!({ "refresh": user.refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/logout",
        None,
        Some(json!({ "refresh": rotated })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged out");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token/refresh",
        None,
        Some(json!({ "refresh": rotated })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_protected_route_requires_token(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(&app, "GET", "/api/enrollments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "GET",
        "/api/notifications",
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_otp_verification_consumes_once(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;
    let body = json!({ "email": user.email, "code": "123456" });

    let (first, second) = tokio::join!(
        send(&app, "POST", "/api/auth/verify-otp", None, Some(body.clone())),
        send(&app, "POST", "/api/auth/verify-otp", None, Some(body.clone())),
    );

    let mut statuses = [first.0.as_u16(), second.0.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 400]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deactivated_user_token_is_rejected(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = register_user(&app, "student").await;

    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = send(&app, "GET", "/api/users", Some(&user.access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User is inactive");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_user_token_is_rejected(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "DELETE",
        "/api/auth/delete-account",
        Some(&user.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Account deleted successfully.");

    let (status, body) = send(&app, "GET", "/api/users", Some(&user.access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_role_change_applies_to_existing_token(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let user = register_user(&app, "student").await;

    sqlx::query("UPDATE users SET role = 'parent' WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&user.access),
        Some(json!({ "course_id": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only students can enroll in courses.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_admin_cannot_delete_other_accounts(pool: PgPool) {
    let app = setup_test_app(pool);
    let user = register_user(&app, "student").await;
    let other = register_user(&app, "parent").await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/auth/delete-account?user_id={}", other.id),
        Some(&user.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "You do not have permission to delete other users."
    );

    let (status, _) = send(&app, "GET", "/api/users", Some(&other.access), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_deletes_another_account(pool: PgPool) {
    let state = setup_state(pool.clone());
    let admin = create_admin(&pool, &state).await;
    let app = init_router(state);
    let user = register_user(&app, "student").await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/auth/delete-account?user_id={}", user.id),
        Some(&admin.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/auth/delete-account?user_id={}", user.id),
        Some(&admin.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
