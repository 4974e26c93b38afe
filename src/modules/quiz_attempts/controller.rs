use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use academy_core::{AppError, PaginationParams};
use academy_models::{QuizAttemptId, QuizId};

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::quiz_attempts::model::{
    CompleteAttemptRequest, CreateQuizAttemptDto, PaginatedQuizAttemptsResponse, QuizAttempt,
    QuizAttemptFilterParams,
};
use crate::modules::quiz_attempts::service::QuizAttemptService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Loads an attempt the caller may see. Other users' attempts look missing.
async fn visible_attempt(
    state: &AppState,
    auth_user: &AuthUser,
    id: QuizAttemptId,
) -> Result<QuizAttempt, AppError> {
    let attempt = QuizAttemptService::get_attempt(&state.db, id).await?;
    if !auth_user.owns_or_admin(attempt.user_id) {
        return Err(AppError::not_found(anyhow!("Quiz attempt not found")));
    }
    Ok(attempt)
}

/// List quiz attempts
#[utoipa::path(
    get,
    path = "/api/quiz-attempts",
    params(QuizAttemptFilterParams),
    responses(
        (status = 200, description = "The caller's attempts, or all for admins", body = PaginatedQuizAttemptsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Quiz Attempts",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_attempts(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<QuizAttemptFilterParams>,
) -> Result<Json<PaginatedQuizAttemptsResponse>, AppError> {
    let owner = (!auth_user.is_admin()).then(|| auth_user.user_id()).transpose()?;
    let attempts = QuizAttemptService::get_attempts(&state.db, owner, filters).await?;
    Ok(Json(attempts))
}

/// List attempts at one quiz
#[utoipa::path(
    get,
    path = "/api/quizzes/{id}/attempts",
    params(("id" = String, Path, description = "Quiz ID"), PaginationParams),
    responses(
        (status = 200, description = "Attempts at the quiz", body = PaginatedQuizAttemptsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Quiz Attempts",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_quiz_attempts(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(quiz_id): Path<QuizId>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedQuizAttemptsResponse>, AppError> {
    let owner = (!auth_user.is_admin()).then(|| auth_user.user_id()).transpose()?;
    let filters = QuizAttemptFilterParams {
        quiz_id: Some(quiz_id.into_inner()),
        pagination,
    };
    let attempts = QuizAttemptService::get_attempts(&state.db, owner, filters).await?;
    Ok(Json(attempts))
}

/// Start a quiz attempt
#[utoipa::path(
    post,
    path = "/api/quiz-attempts",
    request_body = CreateQuizAttemptDto,
    responses(
        (status = 201, description = "Attempt started", body = QuizAttempt),
        (status = 400, description = "quiz_id missing", body = ErrorResponse),
        (status = 403, description = "Not enrolled in the quiz's course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse)
    ),
    tag = "Quiz Attempts",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_attempt(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateQuizAttemptDto>,
) -> Result<(StatusCode, Json<QuizAttempt>), AppError> {
    let quiz_id = dto
        .quiz_id
        .ok_or_else(|| AppError::invalid("quiz_id is required"))?;
    let attempt = QuizAttemptService::start_attempt(&state.db, &auth_user, quiz_id).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Start an attempt at one quiz
#[utoipa::path(
    post,
    path = "/api/quizzes/{id}/attempts",
    params(("id" = String, Path, description = "Quiz ID")),
    responses(
        (status = 201, description = "Attempt started", body = QuizAttempt),
        (status = 403, description = "Not enrolled in the quiz's course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse)
    ),
    tag = "Quiz Attempts",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn create_quiz_attempt(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(quiz_id): Path<QuizId>,
) -> Result<(StatusCode, Json<QuizAttempt>), AppError> {
    let attempt = QuizAttemptService::start_attempt(&state.db, &auth_user, quiz_id).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Get a quiz attempt
#[utoipa::path(
    get,
    path = "/api/quiz-attempts/{id}",
    params(("id" = String, Path, description = "Attempt ID")),
    responses(
        (status = 200, description = "Attempt found", body = QuizAttempt),
        (status = 404, description = "Attempt not found", body = ErrorResponse)
    ),
    tag = "Quiz Attempts",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_attempt(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<QuizAttemptId>,
) -> Result<Json<QuizAttempt>, AppError> {
    let attempt = visible_attempt(&state, &auth_user, id).await?;
    Ok(Json(attempt))
}

/// Complete a quiz attempt with a score
#[utoipa::path(
    post,
    path = "/api/quiz-attempts/{id}/complete",
    params(("id" = String, Path, description = "Attempt ID")),
    request_body = CompleteAttemptRequest,
    responses(
        (status = 200, description = "Attempt completed", body = QuizAttempt),
        (status = 400, description = "Already completed or score missing", body = ErrorResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse)
    ),
    tag = "Quiz Attempts",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn complete_attempt(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<QuizAttemptId>,
    ValidatedJson(dto): ValidatedJson<CompleteAttemptRequest>,
) -> Result<Json<QuizAttempt>, AppError> {
    visible_attempt(&state, &auth_user, id).await?;
    let attempt = QuizAttemptService::complete_attempt(&state.db, id, dto.score).await?;
    Ok(Json(attempt))
}

/// Delete a quiz attempt
#[utoipa::path(
    delete,
    path = "/api/quiz-attempts/{id}",
    params(("id" = String, Path, description = "Attempt ID")),
    responses(
        (status = 204, description = "Attempt deleted"),
        (status = 404, description = "Attempt not found", body = ErrorResponse)
    ),
    tag = "Quiz Attempts",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_attempt(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<QuizAttemptId>,
) -> Result<StatusCode, AppError> {
    visible_attempt(&state, &auth_user, id).await?;
    QuizAttemptService::delete_attempt(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
