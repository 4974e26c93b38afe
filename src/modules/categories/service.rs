use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::text::slugify;
use academy_core::{AppError, PaginationMeta};
use academy_models::UserId;

use crate::modules::categories::model::{
    Category, CategoryDto, CategoryFilterParams, PaginatedCategoriesResponse,
};

/// Categories with their computed `courses_count`, aliased as `cat` so
/// filters and ordering can use the count like a column.
const CATEGORY_SELECT: &str = r#"SELECT * FROM (
        SELECT
            c.id, c.name, c.slug,
            (SELECT COUNT(*) FROM courses co WHERE co.category_id = c.id) AS courses_count,
            c.created_by, c.updated_by, c.created_at, c.updated_at
        FROM categories c
    ) cat"#;

/// Picks the slug to store: an explicit one wins, otherwise it is derived
/// from `source`. Both are normalized through [`slugify`].
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> Result<String, AppError> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => slugify(explicit),
        None => slugify(source),
    };

    if slug.is_empty() {
        return Err(AppError::invalid(
            "Could not generate a slug. Please provide one.",
        ));
    }
    Ok(slug)
}

fn map_slug_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::invalid("Category with this slug already exists.");
    }
    AppError::database(e)
}

fn clean_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid("Category name cannot be empty"));
    }
    Ok(name.to_string())
}

pub struct CategoryService;

impl CategoryService {
    #[instrument(skip(db, dto))]
    pub async fn create_category(
        db: &PgPool,
        actor: UserId,
        dto: CategoryDto,
    ) -> Result<Category, AppError> {
        let name = clean_name(&dto.name)?;
        let slug = resolve_slug(dto.slug.as_deref(), &name)?;

        let id: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO categories (name, slug, created_by, updated_by)
             VALUES ($1, $2, $3, $3)
             RETURNING id",
        )
        .bind(&name)
        .bind(&slug)
        .bind(actor)
        .fetch_one(db)
        .await
        .map_err(map_slug_conflict)?;

        Self::get_by_id(db, id).await
    }

    async fn get_by_id(db: &PgPool, id: uuid::Uuid) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(&format!("{} WHERE cat.id = $1", CATEGORY_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Category not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_category(db: &PgPool, slug: &str) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(&format!("{} WHERE cat.slug = $1", CATEGORY_SELECT))
            .bind(slug)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Category not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_categories(
        db: &PgPool,
        filters: CategoryFilterParams,
    ) -> Result<PaginatedCategoriesResponse, AppError> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut params = Vec::new();

        if let Some(search) = &filters.search {
            params.push(format!("%{}%", search));
            where_clause.push_str(&format!(
                " AND (cat.name ILIKE ${0} OR cat.slug ILIKE ${0})",
                params.len()
            ));
        }

        let count_query = format!(
            "SELECT COUNT(*) FROM categories cat{}",
            where_clause
        );
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "{}{} ORDER BY {}{}",
            CATEGORY_SELECT,
            where_clause,
            filters.ordering.unwrap_or_default().sql(),
            filters.pagination.sql_suffix()
        );
        let mut data_sql = sqlx::query_as::<_, Category>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let categories = data_sql.fetch_all(db).await?;

        Ok(PaginatedCategoriesResponse {
            data: categories,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Full update. The slug is regenerated when the name changes and no
    /// slug is supplied.
    #[instrument(skip(db, dto))]
    pub async fn update_category(
        db: &PgPool,
        slug: &str,
        actor: UserId,
        dto: CategoryDto,
    ) -> Result<Category, AppError> {
        let current = Self::get_category(db, slug).await?;
        let name = clean_name(&dto.name)?;

        let new_slug = match dto.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => resolve_slug(Some(explicit), &name)?,
            None if name != current.name => resolve_slug(None, &name)?,
            None => current.slug.clone(),
        };

        sqlx::query(
            "UPDATE categories
             SET name = $1, slug = $2, updated_by = $3, updated_at = NOW()
             WHERE id = $4",
        )
        .bind(&name)
        .bind(&new_slug)
        .bind(actor)
        .bind(current.id)
        .execute(db)
        .await
        .map_err(map_slug_conflict)?;

        Self::get_by_id(db, current.id.into_inner()).await
    }

    #[instrument(skip(db))]
    pub async fn delete_category(db: &PgPool, slug: &str) -> Result<(), AppError> {
        let category = Self::get_category(db, slug).await?;

        if category.courses_count > 0 {
            return Err(AppError::invalid(
                "Cannot delete category with existing courses. Please reassign or delete courses first.",
            ));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category.id)
            .execute(db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_prefers_explicit_value() {
        assert_eq!(
            resolve_slug(Some("Data Science"), "Anything").unwrap(),
            "data-science"
        );
        assert_eq!(resolve_slug(Some("  "), "Web Dev").unwrap(), "web-dev");
        assert_eq!(resolve_slug(None, "Web Dev").unwrap(), "web-dev");
    }

    #[test]
    fn slug_must_not_be_empty() {
        assert!(resolve_slug(None, "!!!").is_err());
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(clean_name("  Design ").unwrap(), "Design");
        assert_eq!(
            clean_name("   ").unwrap_err().message(),
            "Category name cannot be empty"
        );
    }
}
