//! Review Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{CreateReviewRequest, ReviewListQuery};
use crate::application::dto::response::{ApiResponse, PageMeta, ReviewResponse};
use crate::application::services::{
    CreateReviewDto, ReviewError, ReviewListParams, ReviewService, ReviewServiceImpl,
};
use crate::infrastructure::repositories::{PgReviewRepository, PgServiceRepository};
use crate::presentation::middleware::{AuthUser, UserRole};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::parse_id;

fn reviews(state: &AppState) -> ReviewServiceImpl<PgReviewRepository, PgServiceRepository> {
    ReviewServiceImpl::new(
        Arc::new(PgReviewRepository::new(state.db.clone())),
        Arc::new(PgServiceRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_err(e: ReviewError) -> AppError {
    match e {
        ReviewError::NotFound => AppError::NotFound("Review not found".into()),
        ReviewError::ServiceNotFound => AppError::NotFound("Service not found".into()),
        ReviewError::Conflict(msg) => AppError::Conflict(msg),
        ReviewError::Validation(msg) => AppError::Validation(msg),
        ReviewError::Internal(msg) => AppError::Internal(msg),
    }
}

/// List reviews for a service (public)
pub async fn list_service_reviews(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewResponse>>>, AppError> {
    let service_id = parse_id(&service_id, "service")?;

    let params = ReviewListParams {
        cursor: query.cursor,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        rating: query.rating,
    };

    let page = reviews(&state)
        .list_for_service(service_id, params)
        .await
        .map_err(map_err)?;

    let meta = PageMeta::of(&page);
    let data: Vec<ReviewResponse> = page.items.into_iter().map(ReviewResponse::from).collect();

    Ok(Json(ApiResponse::paginated("Reviews retrieved", data, meta)))
}

/// Create a review for a service (authenticated)
pub async fn create_service_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(service_id): Path<String>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponse>>), AppError> {
    let service_id = parse_id(&service_id, "service")?;
    body.validate().map_err(validation_error)?;

    let dto = CreateReviewDto {
        rating: body.rating,
        comment: body.comment,
    };

    let review = reviews(&state)
        .create_review(service_id, auth.user_id, dto)
        .await
        .map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Review created",
            ReviewResponse::from(review),
        )),
    ))
}

/// Get review by ID (public)
pub async fn get_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<ApiResponse<ReviewResponse>>, AppError> {
    let review_id = parse_id(&review_id, "review")?;

    let review = reviews(&state).get_review(review_id).await.map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Review retrieved",
        ReviewResponse::from(review),
    )))
}

/// Delete a review (ADMIN+)
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(review_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    auth.require(UserRole::Admin)?;

    let review_id = parse_id(&review_id, "review")?;

    reviews(&state).delete_review(review_id).await.map_err(map_err)?;

    Ok(Json(ApiResponse::success(
        "Review deleted",
        serde_json::json!({ "deleted": true }),
    )))
}
