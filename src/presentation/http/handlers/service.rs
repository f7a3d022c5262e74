//! Service (Listing) Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    CreateServiceRequest, ServiceListQuery, UpdateServiceRequest,
};
use crate::application::dto::response::{ApiResponse, PageMeta, ServiceResponse};
use crate::application::services::{
    CatalogError, CatalogService, CatalogServiceImpl, CreateServiceDto, ServiceListParams,
    UpdateServiceDto,
};
use crate::domain::{ServiceFilter, ServiceStatus};
use crate::infrastructure::repositories::PgServiceRepository;
use crate::presentation::middleware::{AuthUser, UserRole};
use crate::shared::error::AppError;
use crate::shared::validation::{coerce_bool_param, validation_error};
use crate::startup::AppState;

use super::{parse_id, to_money};

fn catalog(state: &AppState) -> CatalogServiceImpl<PgServiceRepository> {
    CatalogServiceImpl::new(
        Arc::new(PgServiceRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_err(e: CatalogError) -> AppError {
    match e {
        CatalogError::NotFound => AppError::NotFound("Service not found".into()),
        CatalogError::Conflict(msg) => AppError::Conflict(msg),
        CatalogError::Validation(msg) => AppError::Validation(msg),
        CatalogError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Parse an optional status filter/field strictly.
fn parse_status(raw: Option<&str>) -> Result<Option<ServiceStatus>, AppError> {
    match raw {
        Some(s) => ServiceStatus::try_from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", s))),
        None => Ok(None),
    }
}

/// List services (public)
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<ApiResponse<Vec<ServiceResponse>>>, AppError> {
    let filter = ServiceFilter {
        search: query.search,
        status: parse_status(query.status.as_deref())?,
        category_id: query.category_id,
        category_slug: query.category_slug,
        is_featured: coerce_bool_param(query.is_featured.as_deref()),
        seller_id: query.seller_id,
    };

    let params = ServiceListParams {
        cursor: query.cursor,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        filter,
    };

    let page = catalog(&state)
        .list_services(params)
        .await
        .map_err(map_err)?;

    let meta = PageMeta::of(&page);
    let data: Vec<ServiceResponse> = page.items.into_iter().map(ServiceResponse::from).collect();

    Ok(Json(ApiResponse::paginated("Services retrieved", data, meta)))
}

/// Get service by ID (public)
pub async fn get_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> Result<Json<ApiResponse<ServiceResponse>>, AppError> {
    let service_id = parse_id(&service_id, "service")?;

    let service = catalog(&state)
        .get_service(service_id)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Service retrieved",
        ServiceResponse::from(service),
    )))
}

/// Get service by slug (public)
pub async fn get_service_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ServiceResponse>>, AppError> {
    let service = catalog(&state)
        .get_service_by_slug(&slug)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Service retrieved",
        ServiceResponse::from(service),
    )))
}

/// Create a new service (EDITOR+)
pub async fn create_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceResponse>>), AppError> {
    auth.require(UserRole::Editor)?;

    body.validate().map_err(validation_error)?;

    let dto = CreateServiceDto {
        slug: body.slug,
        title: body.title,
        description: body.description,
        price: to_money(body.price)?,
        seller_id: parse_id(&body.seller_id, "seller")?,
        category_id: body
            .category_id
            .as_deref()
            .map(|id| parse_id(id, "category"))
            .transpose()?,
        status: parse_status(body.status.as_deref())?.unwrap_or_default(),
        sort_order: body.sort_order.unwrap_or(0),
        is_featured: body.is_featured.unwrap_or(false),
    };

    let service = catalog(&state).create_service(dto).await.map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Service created",
            ServiceResponse::from(service),
        )),
    ))
}

/// Update a service (EDITOR+)
pub async fn update_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(service_id): Path<String>,
    Json(body): Json<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<ServiceResponse>>, AppError> {
    auth.require(UserRole::Editor)?;

    let service_id = parse_id(&service_id, "service")?;
    body.validate().map_err(validation_error)?;

    let dto = UpdateServiceDto {
        slug: body.slug,
        title: body.title,
        description: body.description,
        price: body.price.map(to_money).transpose()?,
        category_id: body
            .category_id
            .map(|opt| opt.as_deref().map(|id| parse_id(id, "category")).transpose())
            .transpose()?,
        status: parse_status(body.status.as_deref())?,
        sort_order: body.sort_order,
        is_featured: body.is_featured,
    };

    let service = catalog(&state)
        .update_service(service_id, dto)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Service updated",
        ServiceResponse::from(service),
    )))
}

/// Soft-delete a service (ADMIN+)
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(service_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    auth.require(UserRole::Admin)?;

    let service_id = parse_id(&service_id, "service")?;

    catalog(&state)
        .delete_service(service_id)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Service deleted",
        serde_json::json!({ "deleted": true }),
    )))
}
