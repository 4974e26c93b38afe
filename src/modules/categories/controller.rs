use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use academy_core::AppError;

use crate::audit_event;
use crate::middleware::auth::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::categories::model::{
    Category, CategoryDto, CategoryFilterParams, PaginatedCategoriesResponse,
};
use crate::modules::categories::service::CategoryService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List categories
#[utoipa::path(
    get,
    path = "/api/categories",
    params(CategoryFilterParams),
    responses(
        (status = 200, description = "Categories", body = PaginatedCategoriesResponse)
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
    Query(filters): Query<CategoryFilterParams>,
) -> Result<Json<PaginatedCategoriesResponse>, AppError> {
    let categories = CategoryService::get_categories(&state.db, filters).await?;
    Ok(Json(categories))
}

/// Get a category by slug
#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryService::get_category(&state.db, &slug).await?;
    Ok(Json(category))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryDto,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Empty name or duplicate slug", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CategoryDto>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = CategoryService::create_category(&state.db, admin.user_id()?, dto).await?;
    audit_event!("category_created", "category", slug = %category.slug);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Replace a category
#[utoipa::path(
    put,
    path = "/api/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    request_body = CategoryDto,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Empty name or duplicate slug", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(slug): Path<String>,
    ValidatedJson(dto): ValidatedJson<CategoryDto>,
) -> Result<Json<Category>, AppError> {
    let category =
        CategoryService::update_category(&state.db, &slug, admin.user_id()?, dto).await?;
    Ok(Json(category))
}

/// Partial updates are not supported
#[utoipa::path(
    patch,
    path = "/api/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 405, description = "Use PUT for updates", body = ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(_admin))]
pub async fn patch_category(
    _admin: RequireAdmin,
    Path(_slug): Path<String>,
) -> Result<Json<Category>, AppError> {
    Err(AppError::method_not_allowed(
        "PATCH method is not allowed. Use PUT for updates.",
    ))
}

/// Delete a category without courses
#[utoipa::path(
    delete,
    path = "/api/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, description = "Category still has courses", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    CategoryService::delete_category(&state.db, &slug).await?;
    audit_event!("category_deleted", "category", slug = %slug);
    Ok(StatusCode::NO_CONTENT)
}
