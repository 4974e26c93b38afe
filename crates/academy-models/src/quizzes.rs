//! Quizzes and quiz attempts.

use academy_core::serde::deserialize_optional_uuid;
use academy_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::ids::{CourseId, LessonId, QuizAttemptId, QuizId, UserId};

/// A quiz hangs off exactly one of a course or a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Quiz {
    pub id: QuizId,
    pub course_id: Option<CourseId>,
    pub lesson_id: Option<LessonId>,
    pub title: String,
    pub description: String,
    /// Minimum score (0-100) to pass
    pub passing_score: i32,
    /// Minutes, 0 for no limit
    pub time_limit: i32,
    pub is_published: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateQuizDto {
    pub course_id: Option<CourseId>,
    /// Taken from the path on `/lessons/{lesson_id}/quizzes`
    pub lesson_id: Option<LessonId>,
    #[validate(length(max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_passing_score")]
    #[validate(range(min = 0, max = 100))]
    pub passing_score: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub time_limit: i32,
    #[serde(default)]
    pub is_published: bool,
}

fn default_passing_score() -> i32 {
    70
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateQuizDto {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    #[validate(range(min = 0))]
    pub time_limit: Option<i32>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuizFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub lesson_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedQuizzesResponse {
    pub data: Vec<Quiz>,
    pub meta: PaginationMeta,
}

/// An attempt joined with the student's name and the quiz title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct QuizAttempt {
    pub id: QuizAttemptId,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    #[schema(value_type = String, example = "85.50")]
    pub score: Decimal,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent_minutes: i32,
    pub is_passed: bool,
    pub student_name: String,
    pub quiz_title: String,
}

impl QuizAttempt {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateQuizAttemptDto {
    /// Taken from the path on `/quizzes/{quiz_id}/attempts`
    pub quiz_id: Option<QuizId>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CompleteAttemptRequest {
    #[schema(value_type = Option<String>, example = "85.50")]
    pub score: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuizAttemptFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub quiz_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedQuizAttemptsResponse {
    pub data: Vec<QuizAttempt>,
    pub meta: PaginationMeta,
}

/// Whole minutes between two instants, never negative.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    (end - start).num_minutes().clamp(0, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn passing_score_defaults_to_seventy() {
        let dto: CreateQuizDto = serde_json::from_str(r#"{"title":"Week 1"}"#).unwrap();
        assert_eq!(dto.passing_score, 70);
        assert_eq!(dto.time_limit, 0);
    }

    #[test]
    fn passing_score_is_bounded() {
        let dto: CreateQuizDto =
            serde_json::from_str(r#"{"title":"Week 1","passing_score":120}"#).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn minutes_are_truncated() {
        let start = Utc::now();
        assert_eq!(minutes_between(start, start + Duration::seconds(179)), 2);
        assert_eq!(minutes_between(start, start - Duration::minutes(5)), 0);
    }
}
