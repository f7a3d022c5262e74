//! Seller Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    CreateSellerRequest, SellerListQuery, UpdateSellerRequest, UpdateSellerStatusRequest,
};
use crate::application::dto::response::{ApiResponse, PageMeta, SellerResponse};
use crate::application::services::{
    CreateSellerDto, SellerError, SellerListParams, SellerService, SellerServiceImpl,
    UpdateSellerDto,
};
use crate::domain::{SellerFilter, SellerStatus};
use crate::infrastructure::repositories::PgSellerRepository;
use crate::presentation::middleware::{AuthUser, UserRole};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::{parse_id, to_money};

fn sellers(state: &AppState) -> SellerServiceImpl<PgSellerRepository> {
    SellerServiceImpl::new(
        Arc::new(PgSellerRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_err(e: SellerError) -> AppError {
    match e {
        SellerError::NotFound => AppError::NotFound("Seller not found".into()),
        SellerError::Conflict(msg) => AppError::Conflict(msg),
        SellerError::Validation(msg) => AppError::Validation(msg),
        SellerError::Internal(msg) => AppError::Internal(msg),
    }
}

fn parse_status(raw: &str) -> Result<SellerStatus, AppError> {
    SellerStatus::try_from_str(raw)
        .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", raw)))
}

/// List sellers (public)
pub async fn list_sellers(
    State(state): State<AppState>,
    Query(query): Query<SellerListQuery>,
) -> Result<Json<ApiResponse<Vec<SellerResponse>>>, AppError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let params = SellerListParams {
        cursor: query.cursor,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        filter: SellerFilter {
            search: query.search,
            status,
        },
    };

    let page = sellers(&state).list_sellers(params).await.map_err(map_err)?;

    let meta = PageMeta::of(&page);
    let data: Vec<SellerResponse> = page.items.into_iter().map(SellerResponse::from).collect();

    Ok(Json(ApiResponse::paginated("Sellers retrieved", data, meta)))
}

/// Get seller by ID (public)
pub async fn get_seller(
    State(state): State<AppState>,
    Path(seller_id): Path<String>,
) -> Result<Json<ApiResponse<SellerResponse>>, AppError> {
    let seller_id = parse_id(&seller_id, "seller")?;

    let seller = sellers(&state).get_seller(seller_id).await.map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Seller retrieved",
        SellerResponse::from(seller),
    )))
}

/// Onboard a new seller (ADMIN+)
pub async fn create_seller(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateSellerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SellerResponse>>), AppError> {
    auth.require(UserRole::Admin)?;

    body.validate().map_err(validation_error)?;

    let dto = CreateSellerDto {
        user_id: parse_id(&body.user_id, "user")?,
        display_name: body.display_name,
        commission_rate: to_money(body.commission_rate)?,
    };

    let seller = sellers(&state).create_seller(dto).await.map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Seller created",
            SellerResponse::from(seller),
        )),
    ))
}

/// Update seller profile / commission rate (ADMIN+)
pub async fn update_seller(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(seller_id): Path<String>,
    Json(body): Json<UpdateSellerRequest>,
) -> Result<Json<ApiResponse<SellerResponse>>, AppError> {
    auth.require(UserRole::Admin)?;

    let seller_id = parse_id(&seller_id, "seller")?;
    body.validate().map_err(validation_error)?;

    let dto = UpdateSellerDto {
        display_name: body.display_name,
        commission_rate: body.commission_rate.map(to_money).transpose()?,
    };

    let seller = sellers(&state)
        .update_seller(seller_id, dto)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Seller updated",
        SellerResponse::from(seller),
    )))
}

/// Transition seller status (ADMIN+)
pub async fn update_seller_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(seller_id): Path<String>,
    Json(body): Json<UpdateSellerStatusRequest>,
) -> Result<Json<ApiResponse<SellerResponse>>, AppError> {
    auth.require(UserRole::Admin)?;

    let seller_id = parse_id(&seller_id, "seller")?;
    let next = parse_status(&body.status)?;

    let seller = sellers(&state)
        .update_status(seller_id, next)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Seller status updated",
        SellerResponse::from(seller),
    )))
}
