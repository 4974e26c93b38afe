use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, PaginationMeta};
use academy_models::users::UserSummary;
use academy_models::{CourseId, UserId};

use crate::modules::categories::service::resolve_slug;
use crate::modules::courses::model::{
    Course, CourseDetail, CourseFilterParams, CourseListItem, CreateCourseDto,
    PaginatedCoursesResponse, UpdateCourseDto,
};

const COURSE_COLUMNS: &str = "id, title, description, slug, price, is_published, status, level, \
     cover_image, cover_video, enrollment_count, duration, start_date, end_date, category_id, \
     created_by, updated_by, created_at, updated_at";

fn map_course_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::invalid("Course with this slug already exists.");
        }
        if db_err.is_foreign_key_violation() {
            return AppError::invalid("Category does not exist.");
        }
    }
    AppError::database(e)
}

fn clean_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::invalid("Course title cannot be empty"));
    }
    Ok(title.to_string())
}

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db, dto))]
    pub async fn create_course(
        db: &PgPool,
        actor: UserId,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        let title = clean_title(&dto.title)?;
        let slug = resolve_slug(dto.slug.as_deref(), &title)?;

        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (
                title, description, slug, price, is_published, status, level,
                cover_image, cover_video, duration, start_date, end_date, category_id,
                created_by, updated_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(&title)
        .bind(&dto.description)
        .bind(&slug)
        .bind(dto.price)
        .bind(dto.is_published)
        .bind(dto.status)
        .bind(dto.level)
        .bind(&dto.cover_image)
        .bind(&dto.cover_video)
        .bind(dto.duration)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.category_id)
        .bind(actor)
        .fetch_one(db)
        .await
        .map_err(map_course_error)?;

        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, id: CourseId) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = $1",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    /// The course with its category name and creator/updater summaries.
    #[instrument(skip(db))]
    pub async fn get_course_detail(db: &PgPool, id: CourseId) -> Result<CourseDetail, AppError> {
        let course = Self::get_course(db, id).await?;

        let category_name: String =
            sqlx::query_scalar("SELECT name FROM categories WHERE id = $1")
                .bind(course.category_id)
                .fetch_optional(db)
                .await?
                .unwrap_or_default();

        let created_by_user = Self::user_summary(db, course.created_by).await?;
        let updated_by_user = Self::user_summary(db, course.updated_by).await?;

        Ok(CourseDetail {
            course,
            category_name,
            created_by_user,
            updated_by_user,
        })
    }

    async fn user_summary(
        db: &PgPool,
        id: Option<UserId>,
    ) -> Result<Option<UserSummary>, AppError> {
        let Some(id) = id else { return Ok(None) };

        let summary = sqlx::query_as::<_, UserSummary>(
            "SELECT id, email, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(summary)
    }

    #[instrument(skip(db))]
    pub async fn get_courses(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(category) = filters.category {
            params.push(category.to_string());
            where_clause.push_str(&format!(" AND c.category_id = ${}::uuid", params.len()));
        }
        if let Some(level) = filters.level {
            params.push(level.as_str().to_string());
            where_clause.push_str(&format!(" AND c.level = ${}", params.len()));
        }
        if let Some(status) = filters.status {
            params.push(status.as_str().to_string());
            where_clause.push_str(&format!(" AND c.status = ${}", params.len()));
        }
        if let Some(is_published) = filters.is_published {
            params.push(is_published.to_string());
            where_clause.push_str(&format!(" AND c.is_published = ${}::boolean", params.len()));
        }
        if let Some(search) = &filters.search {
            params.push(format!("%{}%", search));
            where_clause.push_str(&format!(
                " AND (c.title ILIKE ${0} OR c.description ILIKE ${0})",
                params.len()
            ));
        }

        let count_query = format!("SELECT COUNT(*) FROM courses c{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            r#"SELECT
                c.id, c.title, c.slug, c.price, c.is_published, c.status, c.level,
                c.cover_image, c.enrollment_count, c.duration, c.start_date, c.end_date,
                c.category_id, cat.name AS category_name, c.created_at
               FROM courses c
               JOIN categories cat ON cat.id = c.category_id{}
               ORDER BY c.created_at DESC{}"#,
            where_clause,
            filters.pagination.sql_suffix()
        );
        let mut data_sql = sqlx::query_as::<_, CourseListItem>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let courses = data_sql.fetch_all(db).await?;

        Ok(PaginatedCoursesResponse {
            data: courses,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Partial update; PUT and PATCH share it. A title change without an
    /// explicit slug regenerates the slug.
    #[instrument(skip(db, dto))]
    pub async fn update_course(
        db: &PgPool,
        id: CourseId,
        actor: UserId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let current = Self::get_course(db, id).await?;

        let title = match dto.title.as_deref() {
            Some(title) => Some(clean_title(title)?),
            None => None,
        };
        let slug = match (dto.slug.as_deref(), &title) {
            (Some(explicit), _) if !explicit.trim().is_empty() => {
                Some(resolve_slug(Some(explicit), &current.title)?)
            }
            (_, Some(title)) if *title != current.title => Some(resolve_slug(None, title)?),
            _ => None,
        };

        let course = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                slug = COALESCE($3, slug),
                price = COALESCE($4, price),
                is_published = COALESCE($5, is_published),
                status = COALESCE($6, status),
                level = COALESCE($7, level),
                cover_image = COALESCE($8, cover_image),
                cover_video = COALESCE($9, cover_video),
                duration = COALESCE($10, duration),
                start_date = COALESCE($11, start_date),
                end_date = COALESCE($12, end_date),
                category_id = COALESCE($13, category_id),
                updated_by = $14,
                updated_at = NOW()
             WHERE id = $15
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(title)
        .bind(dto.description)
        .bind(slug)
        .bind(dto.price)
        .bind(dto.is_published)
        .bind(dto.status)
        .bind(dto.level)
        .bind(dto.cover_image)
        .bind(dto.cover_video)
        .bind(dto.duration)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.category_id)
        .bind(actor)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(map_course_error)?;

        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, id: CourseId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }
        Ok(())
    }

    /// Sets `enrollment_count` to the number of active enrollments.
    #[instrument(skip(db))]
    pub async fn refresh_enrollment_count(db: &PgPool, id: CourseId) -> Result<i32, AppError> {
        let count: i32 = sqlx::query_scalar(
            "UPDATE courses
             SET enrollment_count = (
                SELECT COUNT(*) FROM enrollments
                WHERE course_id = $1 AND status = 'active'
             )
             WHERE id = $1
             RETURNING enrollment_count",
        )
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_trimmed() {
        assert_eq!(clean_title("  Rust 101 ").unwrap(), "Rust 101");
        assert_eq!(
            clean_title("").unwrap_err().message(),
            "Course title cannot be empty"
        );
    }
}
