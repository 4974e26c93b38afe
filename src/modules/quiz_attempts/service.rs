use anyhow::anyhow;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta};
use academy_models::{QuizAttemptId, QuizId, UserId};

use crate::middleware::auth::AuthUser;
use crate::modules::enrollments::service::EnrollmentService;
use crate::modules::quiz_attempts::model::{
    PaginatedQuizAttemptsResponse, QuizAttempt, QuizAttemptFilterParams, minutes_between,
};
use crate::modules::quizzes::service::QuizService;

/// Attempts joined with the student's display name and the quiz title.
const ATTEMPT_SELECT: &str = r#"SELECT
        a.id, a.user_id, a.quiz_id, a.score, a.started_at, a.completed_at,
        a.time_spent_minutes, a.is_passed,
        COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.email) AS student_name,
        q.title AS quiz_title
    FROM quiz_attempts a
    JOIN users u ON u.id = a.user_id
    JOIN quizzes q ON q.id = a.quiz_id"#;

pub fn is_passing(score: Decimal, passing_score: i32) -> bool {
    score >= Decimal::from(passing_score)
}

pub struct QuizAttemptService;

impl QuizAttemptService {
    /// Starts an attempt. Non-admins need an active enrollment in the
    /// quiz's course, or the course of the quiz's lesson.
    #[instrument(skip(db, caller))]
    pub async fn start_attempt(
        db: &PgPool,
        caller: &AuthUser,
        quiz_id: QuizId,
    ) -> Result<QuizAttempt, AppError> {
        let user_id = caller.user_id()?;
        let quiz = QuizService::get_quiz(db, quiz_id).await?;

        if !caller.is_admin() {
            let enrolled = match QuizService::course_of(db, &quiz).await? {
                Some(course_id) => {
                    EnrollmentService::has_active_enrollment(db, user_id, course_id).await?
                }
                None => false,
            };
            if !enrolled {
                return Err(AppError::forbidden(
                    "You must be enrolled in this course to attempt this quiz.",
                ));
            }
        }

        let id: QuizAttemptId = sqlx::query_scalar(
            "INSERT INTO quiz_attempts (user_id, quiz_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(quiz.id)
        .fetch_one(db)
        .await?;

        Self::get_attempt(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_attempt(db: &PgPool, id: QuizAttemptId) -> Result<QuizAttempt, AppError> {
        sqlx::query_as::<_, QuizAttempt>(&format!("{} WHERE a.id = $1", ATTEMPT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Quiz attempt not found")))
    }

    /// Attempts visible to the caller, newest first. `owner` of `None`
    /// lists everyone's attempts.
    #[instrument(skip(db))]
    pub async fn get_attempts(
        db: &PgPool,
        owner: Option<UserId>,
        filters: QuizAttemptFilterParams,
    ) -> Result<PaginatedQuizAttemptsResponse, AppError> {
        let where_clause = " WHERE ($1::uuid IS NULL OR a.user_id = $1) \
                             AND ($2::uuid IS NULL OR a.quiz_id = $2)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM quiz_attempts a{}",
            where_clause
        ))
        .bind(owner)
        .bind(filters.quiz_id)
        .fetch_one(db)
        .await?;

        let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
            "{}{} ORDER BY a.started_at DESC{}",
            ATTEMPT_SELECT,
            where_clause,
            filters.pagination.sql_suffix()
        ))
        .bind(owner)
        .bind(filters.quiz_id)
        .fetch_all(db)
        .await?;

        Ok(PaginatedQuizAttemptsResponse {
            data: attempts,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Finishes an attempt: records the score, the whole minutes spent and
    /// whether it reached the quiz's passing score.
    #[instrument(skip(db))]
    pub async fn complete_attempt(
        db: &PgPool,
        id: QuizAttemptId,
        score: Option<Decimal>,
    ) -> Result<QuizAttempt, AppError> {
        let attempt = Self::get_attempt(db, id).await?;

        if attempt.is_completed() {
            return Err(AppError::invalid(
                "This attempt has already been completed.",
            ));
        }
        let score =
            score.ok_or_else(|| AppError::invalid("Score is required to complete an attempt."))?;

        let quiz = QuizService::get_quiz(db, attempt.quiz_id).await?;
        let now = Utc::now();

        sqlx::query(
            "UPDATE quiz_attempts
             SET score = $1, completed_at = $2, time_spent_minutes = $3, is_passed = $4
             WHERE id = $5",
        )
        .bind(score)
        .bind(now)
        .bind(minutes_between(attempt.started_at, now))
        .bind(is_passing(score, quiz.passing_score))
        .bind(id)
        .execute(db)
        .await?;

        Self::get_attempt(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_attempt(db: &PgPool, id: QuizAttemptId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM quiz_attempts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_is_inclusive() {
        assert!(is_passing(Decimal::new(7000, 2), 70));
        assert!(is_passing(Decimal::new(9550, 2), 70));
        assert!(!is_passing(Decimal::new(6999, 2), 70));
    }
}
