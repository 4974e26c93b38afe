use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta};
use academy_models::{CourseId, LessonId, UserId};

use crate::modules::lessons::model::{
    CreateLessonDto, Lesson, LessonFilterParams, PaginatedLessonsResponse, UpdateLessonDto,
};

const LESSON_COLUMNS: &str = "id, course_id, title, description, content, video_url, duration, \
     position, is_published, created_by, updated_by, created_at, updated_at";

fn map_lesson_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_foreign_key_violation()
    {
        return AppError::invalid("Course does not exist.");
    }
    AppError::database(e)
}

pub struct LessonService;

impl LessonService {
    #[instrument(skip(db, dto))]
    pub async fn create_lesson(
        db: &PgPool,
        actor: UserId,
        dto: CreateLessonDto,
    ) -> Result<Lesson, AppError> {
        let course_id = dto
            .course_id
            .ok_or_else(|| AppError::invalid("course_id is required"))?;

        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            "INSERT INTO lessons (
                course_id, title, description, content, video_url, duration, position,
                is_published, created_by, updated_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {}",
            LESSON_COLUMNS
        ))
        .bind(course_id)
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(&dto.content)
        .bind(&dto.video_url)
        .bind(dto.duration)
        .bind(dto.position)
        .bind(dto.is_published)
        .bind(actor)
        .fetch_one(db)
        .await
        .map_err(map_lesson_error)?;

        Ok(lesson)
    }

    #[instrument(skip(db))]
    pub async fn get_lesson(db: &PgPool, id: LessonId) -> Result<Lesson, AppError> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons WHERE id = $1",
            LESSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Lesson not found")))
    }

    /// Lessons in course order, optionally limited to one course.
    #[instrument(skip(db))]
    pub async fn get_lessons(
        db: &PgPool,
        filters: LessonFilterParams,
    ) -> Result<PaginatedLessonsResponse, AppError> {
        let course_id = filters.course_id.map(CourseId::from);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lessons WHERE ($1::uuid IS NULL OR course_id = $1)",
        )
        .bind(course_id)
        .fetch_one(db)
        .await?;

        let lessons = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons
             WHERE ($1::uuid IS NULL OR course_id = $1)
             ORDER BY position ASC, created_at ASC{}",
            LESSON_COLUMNS,
            filters.pagination.sql_suffix()
        ))
        .bind(course_id)
        .fetch_all(db)
        .await?;

        Ok(PaginatedLessonsResponse {
            data: lessons,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn update_lesson(
        db: &PgPool,
        id: LessonId,
        actor: UserId,
        dto: UpdateLessonDto,
    ) -> Result<Lesson, AppError> {
        sqlx::query_as::<_, Lesson>(&format!(
            "UPDATE lessons SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                content = COALESCE($3, content),
                video_url = COALESCE($4, video_url),
                duration = COALESCE($5, duration),
                position = COALESCE($6, position),
                is_published = COALESCE($7, is_published),
                updated_by = $8,
                updated_at = NOW()
             WHERE id = $9
             RETURNING {}",
            LESSON_COLUMNS
        ))
        .bind(dto.title.map(|t| t.trim().to_string()))
        .bind(dto.description)
        .bind(dto.content)
        .bind(dto.video_url)
        .bind(dto.duration)
        .bind(dto.position)
        .bind(dto.is_published)
        .bind(actor)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Lesson not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_lesson(db: &PgPool, id: LessonId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found(anyhow!("Lesson not found")));
        }
        Ok(())
    }
}
