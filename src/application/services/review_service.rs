//! Review Service
//!
//! Handles buyer reviews on services. One review per (service, reviewer);
//! the unique index is the backstop for the pre-check.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    Review, ReviewFilter, ReviewRepository, ReviewSortField, ServiceRepository,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{CursorPage, PageRequest, SortOrder};
use crate::shared::snowflake::SnowflakeGenerator;

/// Review service trait
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// List reviews for a service with cursor pagination
    async fn list_for_service(
        &self,
        service_id: i64,
        params: ReviewListParams,
    ) -> Result<CursorPage<Review>, ReviewError>;

    /// Get review by ID
    async fn get_review(&self, review_id: i64) -> Result<Review, ReviewError>;

    /// Create a review for a service
    async fn create_review(
        &self,
        service_id: i64,
        reviewer_id: i64,
        dto: CreateReviewDto,
    ) -> Result<Review, ReviewError>;

    /// Delete a review
    async fn delete_review(&self, review_id: i64) -> Result<(), ReviewError>;
}

/// List request parameters
#[derive(Debug, Clone, Default)]
pub struct ReviewListParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    /// Exact rating filter
    pub rating: Option<i32>,
}

/// Create review request
#[derive(Debug, Clone)]
pub struct CreateReviewDto {
    pub rating: i32,
    pub comment: Option<String>,
}

/// Review service errors
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Review not found")]
    NotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReviewError {
    fn from_repo(e: AppError) -> Self {
        match e {
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// ReviewService implementation
pub struct ReviewServiceImpl<R, S>
where
    R: ReviewRepository,
    S: ServiceRepository,
{
    review_repo: Arc<R>,
    service_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<R, S> ReviewServiceImpl<R, S>
where
    R: ReviewRepository,
    S: ServiceRepository,
{
    pub fn new(
        review_repo: Arc<R>,
        service_repo: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            review_repo,
            service_repo,
            id_generator,
        }
    }

    async fn ensure_service_exists(&self, service_id: i64) -> Result<(), ReviewError> {
        self.service_repo
            .find_by_id(service_id)
            .await
            .map_err(ReviewError::from_repo)?
            .ok_or(ReviewError::ServiceNotFound)?;
        Ok(())
    }
}

#[async_trait]
impl<R, S> ReviewService for ReviewServiceImpl<R, S>
where
    R: ReviewRepository + 'static,
    S: ServiceRepository + 'static,
{
    async fn list_for_service(
        &self,
        service_id: i64,
        params: ReviewListParams,
    ) -> Result<CursorPage<Review>, ReviewError> {
        self.ensure_service_exists(service_id).await?;

        let sort = match params.sort_by.as_deref() {
            Some(name) => ReviewSortField::parse(name)
                .ok_or_else(|| ReviewError::Validation(format!("Unknown sort field: {}", name)))?,
            None => ReviewSortField::default(),
        };

        if let Some(rating) = params.rating {
            if !(1..=5).contains(&rating) {
                return Err(ReviewError::Validation(
                    "Rating filter must be between 1 and 5".into(),
                ));
            }
        }

        let page =
            PageRequest::from_parts(params.cursor.as_deref(), params.limit, params.sort_order);

        let filter = ReviewFilter {
            service_id: Some(service_id),
            rating: params.rating,
        };

        let rows = self
            .review_repo
            .list(&filter, sort, &page)
            .await
            .map_err(ReviewError::from_repo)?;

        Ok(CursorPage::assemble(rows, &page, |r| sort.cursor_value(r)))
    }

    async fn get_review(&self, review_id: i64) -> Result<Review, ReviewError> {
        self.review_repo
            .find_by_id(review_id)
            .await
            .map_err(ReviewError::from_repo)?
            .ok_or(ReviewError::NotFound)
    }

    async fn create_review(
        &self,
        service_id: i64,
        reviewer_id: i64,
        dto: CreateReviewDto,
    ) -> Result<Review, ReviewError> {
        if !(1..=5).contains(&dto.rating) {
            return Err(ReviewError::Validation(
                "Rating must be between 1 and 5".into(),
            ));
        }

        // Reviews on soft-deleted services resolve to NotFound like any
        // other read.
        self.ensure_service_exists(service_id).await?;

        let already = self
            .review_repo
            .exists_for_reviewer(service_id, reviewer_id)
            .await
            .map_err(ReviewError::from_repo)?;
        if already {
            return Err(ReviewError::Conflict(
                "You have already reviewed this service".into(),
            ));
        }

        let now = Utc::now();
        let review = Review {
            id: self.id_generator.generate(),
            service_id,
            reviewer_id,
            rating: dto.rating,
            comment: dto.comment,
            created_at: now,
            updated_at: now,
        };

        self.review_repo
            .create(&review)
            .await
            .map_err(ReviewError::from_repo)
    }

    async fn delete_review(&self, review_id: i64) -> Result<(), ReviewError> {
        let deleted = self
            .review_repo
            .delete(review_id)
            .await
            .map_err(ReviewError::from_repo)?;

        if !deleted {
            return Err(ReviewError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockReviewRepository, MockServiceRepository, Service, ServiceStatus};
    use rust_decimal_macros::dec;

    fn live_service(id: i64) -> Service {
        let now = Utc::now();
        Service {
            id,
            slug: "logo-design".to_string(),
            title: "Logo design".to_string(),
            description: "Custom logo design package".to_string(),
            price: dec!(150.00),
            seller_id: 10,
            category_id: None,
            status: ServiceStatus::Active,
            sort_order: 0,
            is_featured: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn reviews(
        review_repo: MockReviewRepository,
        service_repo: MockServiceRepository,
    ) -> ReviewServiceImpl<MockReviewRepository, MockServiceRepository> {
        ReviewServiceImpl::new(
            Arc::new(review_repo),
            Arc::new(service_repo),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        )
    }

    #[tokio::test]
    async fn test_create_review_on_missing_service_fails() {
        let mut service_repo = MockServiceRepository::new();
        service_repo.expect_find_by_id().returning(|_| Ok(None));

        let dto = CreateReviewDto {
            rating: 5,
            comment: None,
        };

        let result = reviews(MockReviewRepository::new(), service_repo)
            .create_review(1, 7, dto)
            .await;
        assert!(matches!(result, Err(ReviewError::ServiceNotFound)));
    }

    #[tokio::test]
    async fn test_create_duplicate_review_conflicts() {
        let mut service_repo = MockServiceRepository::new();
        service_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(live_service(id))));

        let mut review_repo = MockReviewRepository::new();
        review_repo
            .expect_exists_for_reviewer()
            .returning(|_, _| Ok(true));

        let dto = CreateReviewDto {
            rating: 4,
            comment: None,
        };

        let result = reviews(review_repo, service_repo).create_review(1, 7, dto).await;
        assert!(matches!(result, Err(ReviewError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rating_out_of_range_rejected() {
        let dto = CreateReviewDto {
            rating: 6,
            comment: None,
        };

        let result = reviews(MockReviewRepository::new(), MockServiceRepository::new())
            .create_review(1, 7, dto)
            .await;
        assert!(matches!(result, Err(ReviewError::Validation(_))));
    }
}
