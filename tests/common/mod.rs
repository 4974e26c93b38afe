use academy::router::init_router;
use academy::state::AppState;
use academy_auth::create_access_token;
use academy_core::hash_password;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "testpass123";

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub access: String,
    pub refresh: String,
}

pub fn setup_state(pool: PgPool) -> AppState {
    dotenvy::dotenv().ok();
    AppState::for_tests(pool)
}

pub fn setup_test_app(pool: PgPool) -> Router {
    init_router(setup_state(pool))
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

/// Sends a request and returns the status with the JSON body, or `Null`
/// when the body is empty or not JSON.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Registers through the API so the profile rows and preferences exist.
pub async fn register_user(app: &Router, role: &str) -> TestUser {
    let email = generate_unique_email();
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "phone_number": "08012345678",
            "first_name": "Test",
            "last_name": "User",
            "password": TEST_PASSWORD,
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    TestUser {
        id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
        email,
        access: body["tokens"]["access"].as_str().unwrap().to_string(),
        refresh: body["tokens"]["refresh"].as_str().unwrap().to_string(),
    }
}

/// Admins cannot sign up, so they are inserted directly.
pub async fn create_admin(pool: &PgPool, state: &AppState) -> TestUser {
    let email = generate_unique_email();
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, password, role, is_verified, is_staff, is_superuser)
         VALUES ($1, $2, 'admin', TRUE, TRUE, TRUE)
         RETURNING id",
    )
    .bind(&email)
    .bind(&hashed)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO notification_preferences (user_id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();

    let access = create_access_token(id, &email, "admin", true, &state.jwt_config).unwrap();

    TestUser {
        id,
        email,
        access,
        refresh: String::new(),
    }
}

pub async fn create_test_course(pool: &PgPool, published: bool) -> Uuid {
    let suffix = Uuid::new_v4().simple().to_string();

    let category_id: Uuid = sqlx::query_scalar(
        "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("Category {}", suffix))
    .bind(format!("category-{}", suffix))
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query_scalar(
        "INSERT INTO courses (title, slug, price, is_published, status, start_date, end_date, category_id)
         VALUES ($1, $2, 15000, $3, 'active', $4, $5, $6)
         RETURNING id",
    )
    .bind(format!("Course {}", suffix))
    .bind(format!("course-{}", suffix))
    .bind(published)
    .bind(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    .bind(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap())
    .bind(category_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
