use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::middleware::role::require_authenticated;
use crate::modules::auth::router::init_auth_router;
use crate::modules::bookmarks::router::init_bookmarks_router;
use crate::modules::categories::router::init_categories_router;
use crate::modules::certificates::router::init_certificates_router;
use crate::modules::chat::router::init_chat_router;
use crate::modules::courses::router::init_courses_router;
use crate::modules::enrollments::router::{init_enrollments_router, init_students_router};
use crate::modules::lessons::router::init_lessons_router;
use crate::modules::notifications::router::{init_notifications_router, init_preferences_router};
use crate::modules::payments::router::init_payments_router;
use crate::modules::quiz_attempts::router::init_quiz_attempts_router;
use crate::modules::quizzes::router::init_quizzes_router;
use crate::modules::reviews::router::init_reviews_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

fn auth_router(state: &AppState) -> Router<AppState> {
    match state.rate_limit_config.auth_limiter() {
        Some(limiter) => init_auth_router().route_layer(middleware::from_fn_with_state(
            Arc::new(limiter),
            rate_limit_middleware,
        )),
        None => init_auth_router(),
    }
}

/// Routers whose every route needs a signed-in caller.
fn protected_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", init_users_router())
        .nest("/enrollments", init_enrollments_router())
        .nest("/students", init_students_router())
        .nest("/quiz-attempts", init_quiz_attempts_router())
        .nest("/certificates", init_certificates_router())
        .nest("/bookmarks", init_bookmarks_router())
        .nest("/notifications", init_notifications_router())
        .nest("/notification-preferences", init_preferences_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", auth_router(&state))
                .nest("/categories", init_categories_router())
                .nest("/courses", init_courses_router())
                .nest("/lessons", init_lessons_router())
                .nest("/quizzes", init_quizzes_router())
                .nest("/reviews", init_reviews_router())
                .nest("/payments", init_payments_router())
                .merge(protected_router(&state)),
        )
        .merge(init_chat_router())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            logging_middleware,
        ))
        .with_state(state)
}
