//! Payout Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    CreatePayoutRequest, PayoutListQuery, UpdatePayoutStatusRequest,
};
use crate::application::dto::response::{ApiResponse, PageMeta, PayoutResponse};
use crate::application::services::{
    CreatePayoutDto, PayoutError, PayoutListParams, PayoutService, PayoutServiceImpl,
};
use crate::domain::{PayoutFilter, PayoutStatus};
use crate::infrastructure::repositories::{PgPayoutRepository, PgSellerRepository};
use crate::presentation::middleware::{AuthUser, UserRole};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::{parse_id, to_money};

fn payouts(state: &AppState) -> PayoutServiceImpl<PgPayoutRepository, PgSellerRepository> {
    PayoutServiceImpl::new(
        Arc::new(PgPayoutRepository::new(state.db.clone())),
        Arc::new(PgSellerRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_err(e: PayoutError) -> AppError {
    match e {
        PayoutError::NotFound => AppError::NotFound("Payout not found".into()),
        PayoutError::SellerNotFound => AppError::NotFound("Seller not found".into()),
        PayoutError::Conflict(msg) => AppError::Conflict(msg),
        PayoutError::Validation(msg) => AppError::Validation(msg),
        PayoutError::Internal(msg) => AppError::Internal(msg),
    }
}

fn parse_status(raw: &str) -> Result<PayoutStatus, AppError> {
    PayoutStatus::try_from_str(raw)
        .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", raw)))
}

/// List payouts (public)
pub async fn list_payouts(
    State(state): State<AppState>,
    Query(query): Query<PayoutListQuery>,
) -> Result<Json<ApiResponse<Vec<PayoutResponse>>>, AppError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let params = PayoutListParams {
        cursor: query.cursor,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        filter: PayoutFilter {
            seller_id: query.seller_id,
            status,
        },
    };

    let page = payouts(&state).list_payouts(params).await.map_err(map_err)?;

    let meta = PageMeta::of(&page);
    let data: Vec<PayoutResponse> = page.items.into_iter().map(PayoutResponse::from).collect();

    Ok(Json(ApiResponse::paginated("Payouts retrieved", data, meta)))
}

/// Get payout by ID (public)
pub async fn get_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<String>,
) -> Result<Json<ApiResponse<PayoutResponse>>, AppError> {
    let payout_id = parse_id(&payout_id, "payout")?;

    let payout = payouts(&state).get_payout(payout_id).await.map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Payout retrieved",
        PayoutResponse::from(payout),
    )))
}

/// Create a payout for a sales period (ADMIN+)
pub async fn create_payout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreatePayoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PayoutResponse>>), AppError> {
    auth.require(UserRole::Admin)?;

    body.validate().map_err(validation_error)?;

    let dto = CreatePayoutDto {
        seller_id: parse_id(&body.seller_id, "seller")?,
        period_start: body.period_start,
        period_end: body.period_end,
        amount: to_money(body.amount)?,
        item_count: body.item_count,
    };

    let payout = payouts(&state).create_payout(dto).await.map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Payout created",
            PayoutResponse::from(payout),
        )),
    ))
}

/// Advance the payout lifecycle (ADMIN+)
pub async fn update_payout_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(payout_id): Path<String>,
    Json(body): Json<UpdatePayoutStatusRequest>,
) -> Result<Json<ApiResponse<PayoutResponse>>, AppError> {
    auth.require(UserRole::Admin)?;

    let payout_id = parse_id(&payout_id, "payout")?;
    body.validate().map_err(validation_error)?;

    let next = parse_status(&body.status)?;

    let payout = payouts(&state)
        .transition_status(payout_id, next, body.failure_reason)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Payout status updated",
        PayoutResponse::from(payout),
    )))
}
