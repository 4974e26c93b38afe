use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta, PaginationParams};
use academy_models::{BookmarkId, CourseId, UserId};

use crate::modules::bookmarks::model::{Bookmark, PaginatedBookmarksResponse};
use crate::modules::courses::service::CourseService;

const BOOKMARK_SELECT: &str = r#"SELECT
        b.id, b.user_id, b.course_id, c.title AS course_title, b.created_at
    FROM bookmarks b
    JOIN courses c ON c.id = b.course_id"#;

pub struct BookmarkService;

impl BookmarkService {
    #[instrument(skip(db))]
    pub async fn create_bookmark(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Bookmark, AppError> {
        CourseService::get_course(db, course_id).await?;

        let id: BookmarkId = sqlx::query_scalar(
            "INSERT INTO bookmarks (user_id, course_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::invalid("You have already bookmarked this course.");
            }
            AppError::database(e)
        })?;

        Self::get_bookmark(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_bookmark(db: &PgPool, id: BookmarkId) -> Result<Bookmark, AppError> {
        sqlx::query_as::<_, Bookmark>(&format!("{} WHERE b.id = $1", BOOKMARK_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Bookmark not found")))
    }

    /// Newest first. Both filters are optional and combine with AND.
    #[instrument(skip(db))]
    pub async fn get_bookmarks(
        db: &PgPool,
        owner: Option<UserId>,
        student: Option<UserId>,
        pagination: PaginationParams,
    ) -> Result<PaginatedBookmarksResponse, AppError> {
        let where_clause = " WHERE ($1::uuid IS NULL OR b.user_id = $1) \
                             AND ($2::uuid IS NULL OR b.user_id = $2)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM bookmarks b{}",
            where_clause
        ))
        .bind(owner)
        .bind(student)
        .fetch_one(db)
        .await?;

        let bookmarks = sqlx::query_as::<_, Bookmark>(&format!(
            "{}{} ORDER BY b.created_at DESC{}",
            BOOKMARK_SELECT,
            where_clause,
            pagination.sql_suffix()
        ))
        .bind(owner)
        .bind(student)
        .fetch_all(db)
        .await?;

        Ok(PaginatedBookmarksResponse {
            data: bookmarks,
            meta: PaginationMeta::new(total, &pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn delete_bookmark(db: &PgPool, id: BookmarkId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM bookmarks WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
