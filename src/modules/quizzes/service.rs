use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta};
use academy_models::{CourseId, LessonId, QuizId, UserId};

use crate::modules::quizzes::model::{
    CreateQuizDto, PaginatedQuizzesResponse, Quiz, QuizFilterParams, UpdateQuizDto,
};

const QUIZ_COLUMNS: &str = "id, course_id, lesson_id, title, description, passing_score, \
     time_limit, is_published, created_by, created_at, updated_at";

/// A quiz belongs to exactly one of a course or a lesson.
pub fn check_quiz_parent(
    course_id: Option<CourseId>,
    lesson_id: Option<LessonId>,
) -> Result<(), AppError> {
    match (course_id, lesson_id) {
        (None, None) => Err(AppError::invalid(
            "Quiz must be linked to either a course or a lesson",
        )),
        (Some(_), Some(_)) => Err(AppError::invalid(
            "Quiz cannot be linked to both a course and a lesson",
        )),
        _ => Ok(()),
    }
}

fn clean_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::invalid("Quiz title cannot be empty"));
    }
    Ok(title.to_string())
}

pub struct QuizService;

impl QuizService {
    #[instrument(skip(db, dto))]
    pub async fn create_quiz(
        db: &PgPool,
        actor: UserId,
        dto: CreateQuizDto,
    ) -> Result<Quiz, AppError> {
        let title = clean_title(&dto.title)?;
        check_quiz_parent(dto.course_id, dto.lesson_id)?;

        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "INSERT INTO quizzes (
                course_id, lesson_id, title, description, passing_score, time_limit,
                is_published, created_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            QUIZ_COLUMNS
        ))
        .bind(dto.course_id)
        .bind(dto.lesson_id)
        .bind(&title)
        .bind(&dto.description)
        .bind(dto.passing_score)
        .bind(dto.time_limit)
        .bind(dto.is_published)
        .bind(actor)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_foreign_key_violation()
            {
                return AppError::invalid("Course or lesson does not exist.");
            }
            AppError::database(e)
        })?;

        Ok(quiz)
    }

    #[instrument(skip(db))]
    pub async fn get_quiz(db: &PgPool, id: QuizId) -> Result<Quiz, AppError> {
        sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes WHERE id = $1",
            QUIZ_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Quiz not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_quizzes(
        db: &PgPool,
        filters: QuizFilterParams,
    ) -> Result<PaginatedQuizzesResponse, AppError> {
        let where_clause = " WHERE ($1::uuid IS NULL OR lesson_id = $1) \
                             AND ($2::uuid IS NULL OR course_id = $2)";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM quizzes{}", where_clause))
                .bind(filters.lesson_id)
                .bind(filters.course_id)
                .fetch_one(db)
                .await?;

        let quizzes = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes{} ORDER BY created_at DESC{}",
            QUIZ_COLUMNS,
            where_clause,
            filters.pagination.sql_suffix()
        ))
        .bind(filters.lesson_id)
        .bind(filters.course_id)
        .fetch_all(db)
        .await?;

        Ok(PaginatedQuizzesResponse {
            data: quizzes,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn update_quiz(
        db: &PgPool,
        id: QuizId,
        dto: UpdateQuizDto,
    ) -> Result<Quiz, AppError> {
        let title = match dto.title.as_deref() {
            Some(title) => Some(clean_title(title)?),
            None => None,
        };

        sqlx::query_as::<_, Quiz>(&format!(
            "UPDATE quizzes SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                passing_score = COALESCE($3, passing_score),
                time_limit = COALESCE($4, time_limit),
                is_published = COALESCE($5, is_published),
                updated_at = NOW()
             WHERE id = $6
             RETURNING {}",
            QUIZ_COLUMNS
        ))
        .bind(title)
        .bind(dto.description)
        .bind(dto.passing_score)
        .bind(dto.time_limit)
        .bind(dto.is_published)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Quiz not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_quiz(db: &PgPool, id: QuizId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found(anyhow!("Quiz not found")));
        }
        Ok(())
    }

    /// The course a quiz counts towards: its own, or its lesson's.
    #[instrument(skip(db))]
    pub async fn course_of(db: &PgPool, quiz: &Quiz) -> Result<Option<CourseId>, AppError> {
        if let Some(course_id) = quiz.course_id {
            return Ok(Some(course_id));
        }
        let Some(lesson_id) = quiz.lesson_id else {
            return Ok(None);
        };

        let course_id = sqlx::query_scalar::<_, CourseId>(
            "SELECT course_id FROM lessons WHERE id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(db)
        .await?;

        Ok(course_id)
    }
}
