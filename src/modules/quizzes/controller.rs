use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use academy_core::{AppError, PaginationParams};
use academy_models::{LessonId, QuizId};

use crate::middleware::auth::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::quizzes::model::{
    CreateQuizDto, PaginatedQuizzesResponse, Quiz, QuizFilterParams, UpdateQuizDto,
};
use crate::modules::quizzes::service::QuizService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List quizzes
#[utoipa::path(
    get,
    path = "/api/quizzes",
    params(QuizFilterParams),
    responses(
        (status = 200, description = "Quizzes, newest first", body = PaginatedQuizzesResponse)
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state))]
pub async fn get_quizzes(
    State(state): State<AppState>,
    Query(filters): Query<QuizFilterParams>,
) -> Result<Json<PaginatedQuizzesResponse>, AppError> {
    let quizzes = QuizService::get_quizzes(&state.db, filters).await?;
    Ok(Json(quizzes))
}

/// List the quizzes of one lesson
#[utoipa::path(
    get,
    path = "/api/lessons/{id}/quizzes",
    params(("id" = String, Path, description = "Lesson ID"), PaginationParams),
    responses(
        (status = 200, description = "Quizzes of the lesson", body = PaginatedQuizzesResponse)
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state))]
pub async fn get_lesson_quizzes(
    State(state): State<AppState>,
    Path(lesson_id): Path<LessonId>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedQuizzesResponse>, AppError> {
    let filters = QuizFilterParams {
        lesson_id: Some(lesson_id.into_inner()),
        course_id: None,
        pagination,
    };
    let quizzes = QuizService::get_quizzes(&state.db, filters).await?;
    Ok(Json(quizzes))
}

/// Get a quiz
#[utoipa::path(
    get,
    path = "/api/quizzes/{id}",
    params(("id" = String, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz found", body = Quiz),
        (status = 404, description = "Quiz not found", body = ErrorResponse)
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state))]
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<QuizId>,
) -> Result<Json<Quiz>, AppError> {
    let quiz = QuizService::get_quiz(&state.db, id).await?;
    Ok(Json(quiz))
}

/// Create a quiz on a course or a lesson
#[utoipa::path(
    post,
    path = "/api/quizzes",
    request_body = CreateQuizDto,
    responses(
        (status = 201, description = "Quiz created", body = Quiz),
        (status = 400, description = "Empty title or not exactly one parent", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "Quizzes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_quiz(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateQuizDto>,
) -> Result<(StatusCode, Json<Quiz>), AppError> {
    let quiz = QuizService::create_quiz(&state.db, admin.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Create a quiz on a lesson
#[utoipa::path(
    post,
    path = "/api/lessons/{id}/quizzes",
    params(("id" = String, Path, description = "Lesson ID")),
    request_body = CreateQuizDto,
    responses(
        (status = 201, description = "Quiz created", body = Quiz),
        (status = 400, description = "Empty title or also linked to a course", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "Quizzes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_lesson_quiz(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(lesson_id): Path<LessonId>,
    ValidatedJson(mut dto): ValidatedJson<CreateQuizDto>,
) -> Result<(StatusCode, Json<Quiz>), AppError> {
    dto.lesson_id = Some(lesson_id);
    let quiz = QuizService::create_quiz(&state.db, admin.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Update a quiz
#[utoipa::path(
    put,
    path = "/api/quizzes/{id}",
    params(("id" = String, Path, description = "Quiz ID")),
    request_body = UpdateQuizDto,
    responses(
        (status = 200, description = "Quiz updated", body = Quiz),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse)
    ),
    tag = "Quizzes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_quiz(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<QuizId>,
    ValidatedJson(dto): ValidatedJson<UpdateQuizDto>,
) -> Result<Json<Quiz>, AppError> {
    let quiz = QuizService::update_quiz(&state.db, id, dto).await?;
    Ok(Json(quiz))
}

/// Delete a quiz
#[utoipa::path(
    delete,
    path = "/api/quizzes/{id}",
    params(("id" = String, Path, description = "Quiz ID")),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse)
    ),
    tag = "Quizzes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_quiz(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<QuizId>,
) -> Result<StatusCode, AppError> {
    QuizService::delete_quiz(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
