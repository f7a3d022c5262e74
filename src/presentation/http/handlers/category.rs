//! Category Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    CategoryListQuery, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::application::dto::response::{ApiResponse, CategoryResponse, PageMeta};
use crate::application::services::{
    CategoryError, CategoryListParams, CategoryService, CategoryServiceImpl, CreateCategoryDto,
    UpdateCategoryDto,
};
use crate::domain::CategoryFilter;
use crate::infrastructure::repositories::PgCategoryRepository;
use crate::presentation::middleware::{AuthUser, UserRole};
use crate::shared::error::AppError;
use crate::shared::validation::{coerce_bool_param, validation_error};
use crate::startup::AppState;

use super::parse_id;

fn categories(state: &AppState) -> CategoryServiceImpl<PgCategoryRepository> {
    CategoryServiceImpl::new(
        Arc::new(PgCategoryRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_err(e: CategoryError) -> AppError {
    match e {
        CategoryError::NotFound => AppError::NotFound("Category not found".into()),
        CategoryError::Conflict(msg) => AppError::Conflict(msg),
        CategoryError::Validation(msg) => AppError::Validation(msg),
        CategoryError::Internal(msg) => AppError::Internal(msg),
    }
}

/// List categories (public)
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, AppError> {
    let filter = CategoryFilter {
        search: query.search,
        is_active: coerce_bool_param(query.is_active.as_deref()),
        parent_id: query.parent_id,
    };

    let params = CategoryListParams {
        cursor: query.cursor,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        filter,
    };

    let page = categories(&state)
        .list_categories(params)
        .await
        .map_err(map_err)?;

    let meta = PageMeta::of(&page);
    let data: Vec<CategoryResponse> = page.items.into_iter().map(CategoryResponse::from).collect();

    Ok(Json(ApiResponse::paginated(
        "Categories retrieved",
        data,
        meta,
    )))
}

/// Get category by ID (public)
pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Result<Json<ApiResponse<CategoryResponse>>, AppError> {
    let category_id = parse_id(&category_id, "category")?;

    let category = categories(&state)
        .get_category(category_id)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Category retrieved",
        CategoryResponse::from(category),
    )))
}

/// Get category by slug (public)
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<CategoryResponse>>, AppError> {
    let category = categories(&state)
        .get_category_by_slug(&slug)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Category retrieved",
        CategoryResponse::from(category),
    )))
}

/// Create a new category (EDITOR+)
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), AppError> {
    auth.require(UserRole::Editor)?;

    body.validate().map_err(validation_error)?;

    let dto = CreateCategoryDto {
        slug: body.slug,
        name: body.name,
        description: body.description,
        parent_id: body
            .parent_id
            .as_deref()
            .map(|id| parse_id(id, "category"))
            .transpose()?,
        sort_order: body.sort_order.unwrap_or(0),
        is_active: body.is_active.unwrap_or(true),
    };

    let category = categories(&state)
        .create_category(dto)
        .await
        .map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Category created",
            CategoryResponse::from(category),
        )),
    ))
}

/// Update a category (EDITOR+)
pub async fn update_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(category_id): Path<String>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, AppError> {
    auth.require(UserRole::Editor)?;

    let category_id = parse_id(&category_id, "category")?;
    body.validate().map_err(validation_error)?;

    let dto = UpdateCategoryDto {
        slug: body.slug,
        name: body.name,
        description: body.description,
        parent_id: body
            .parent_id
            .map(|opt| opt.as_deref().map(|id| parse_id(id, "category")).transpose())
            .transpose()?,
        sort_order: body.sort_order,
        is_active: body.is_active,
    };

    let category = categories(&state)
        .update_category(category_id, dto)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Category updated",
        CategoryResponse::from(category),
    )))
}

/// Delete a category (ADMIN+)
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(category_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    auth.require(UserRole::Admin)?;

    let category_id = parse_id(&category_id, "category")?;

    categories(&state)
        .delete_category(category_id)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Category deleted",
        serde_json::json!({ "deleted": true }),
    )))
}
