//! Subscription Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use validator::Validate;

use crate::application::dto::request::{
    CreateSubscriptionRequest, CreditAdjustmentRequest, CreditEntryListQuery,
    SubscriptionListQuery,
};
use crate::application::dto::response::{
    ApiResponse, CreditEntryResponse, PageMeta, SubscriptionResponse,
};
use crate::application::services::{
    CreateSubscriptionDto, CreditAdjustmentDto, SubscriptionError, SubscriptionListParams,
    SubscriptionService, SubscriptionServiceImpl,
};
use crate::domain::{SubscriptionFilter, SubscriptionPlan, SubscriptionStatus};
use crate::infrastructure::repositories::PgSubscriptionRepository;
use crate::presentation::middleware::{AuthUser, UserRole};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::parse_id;

fn subscriptions(state: &AppState) -> SubscriptionServiceImpl<PgSubscriptionRepository> {
    SubscriptionServiceImpl::new(
        Arc::new(PgSubscriptionRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_err(e: SubscriptionError) -> AppError {
    match e {
        SubscriptionError::NotFound => AppError::NotFound("Subscription not found".into()),
        SubscriptionError::Conflict(msg) => AppError::Conflict(msg),
        SubscriptionError::Validation(msg) => AppError::Validation(msg),
        SubscriptionError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Combined subscription + ledger entry payload for credit adjustments
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAdjustmentResponse {
    pub subscription: SubscriptionResponse,
    pub entry: CreditEntryResponse,
}

/// List subscriptions (ADMIN+)
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<Json<ApiResponse<Vec<SubscriptionResponse>>>, AppError> {
    auth.require(UserRole::Admin)?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            SubscriptionStatus::try_from_str(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };
    let plan = match query.plan.as_deref() {
        Some(p) => Some(
            SubscriptionPlan::try_from_str(p)
                .ok_or_else(|| AppError::Validation(format!("Unknown plan: {}", p)))?,
        ),
        None => None,
    };

    let params = SubscriptionListParams {
        cursor: query.cursor,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        filter: SubscriptionFilter { status, plan },
    };

    let page = subscriptions(&state)
        .list_subscriptions(params)
        .await
        .map_err(map_err)?;

    let meta = PageMeta::of(&page);
    let data: Vec<SubscriptionResponse> = page
        .items
        .into_iter()
        .map(SubscriptionResponse::from)
        .collect();

    Ok(Json(ApiResponse::paginated(
        "Subscriptions retrieved",
        data,
        meta,
    )))
}

/// Get subscription by ID (public)
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> Result<Json<ApiResponse<SubscriptionResponse>>, AppError> {
    let subscription_id = parse_id(&subscription_id, "subscription")?;

    let subscription = subscriptions(&state)
        .get_subscription(subscription_id)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Subscription retrieved",
        SubscriptionResponse::from(subscription),
    )))
}

/// Open a subscription (ADMIN+)
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubscriptionResponse>>), AppError> {
    auth.require(UserRole::Admin)?;

    let plan = SubscriptionPlan::try_from_str(&body.plan)
        .ok_or_else(|| AppError::Validation(format!("Unknown plan: {}", body.plan)))?;

    let dto = CreateSubscriptionDto {
        user_id: parse_id(&body.user_id, "user")?,
        plan,
    };

    let subscription = subscriptions(&state)
        .create_subscription(dto)
        .await
        .map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Subscription created",
            SubscriptionResponse::from(subscription),
        )),
    ))
}

/// Cancel a subscription (ADMIN+)
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(subscription_id): Path<String>,
) -> Result<Json<ApiResponse<SubscriptionResponse>>, AppError> {
    auth.require(UserRole::Admin)?;

    let subscription_id = parse_id(&subscription_id, "subscription")?;

    let subscription = subscriptions(&state)
        .cancel_subscription(subscription_id)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Subscription canceled",
        SubscriptionResponse::from(subscription),
    )))
}

/// Apply a credit adjustment (ADMIN+)
pub async fn adjust_credits(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(subscription_id): Path<String>,
    Json(body): Json<CreditAdjustmentRequest>,
) -> Result<Json<ApiResponse<CreditAdjustmentResponse>>, AppError> {
    auth.require(UserRole::Admin)?;

    let subscription_id = parse_id(&subscription_id, "subscription")?;
    body.validate().map_err(validation_error)?;

    let dto = CreditAdjustmentDto {
        amount: body.amount,
        reason: body.reason,
    };

    let (subscription, entry) = subscriptions(&state)
        .adjust_credits(subscription_id, dto)
        .await
        .map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Credits adjusted",
        CreditAdjustmentResponse {
            subscription: SubscriptionResponse::from(subscription),
            entry: CreditEntryResponse::from(entry),
        },
    )))
}

/// List credit ledger entries (public)
pub async fn list_credit_entries(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    Query(query): Query<CreditEntryListQuery>,
) -> Result<Json<ApiResponse<Vec<CreditEntryResponse>>>, AppError> {
    let subscription_id = parse_id(&subscription_id, "subscription")?;

    let page = subscriptions(&state)
        .list_credit_entries(subscription_id, query.cursor, query.limit)
        .await
        .map_err(map_err)?;

    let meta = PageMeta::of(&page);
    let data: Vec<CreditEntryResponse> = page
        .items
        .into_iter()
        .map(CreditEntryResponse::from)
        .collect();

    Ok(Json(ApiResponse::paginated(
        "Credit entries retrieved",
        data,
        meta,
    )))
}
