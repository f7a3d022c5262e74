//! Seller Service
//!
//! Handles seller account management: onboarding, profile updates, and the
//! status transition rules. Aggregate counters are read-only projections and
//! never touched here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::{Seller, SellerFilter, SellerRepository, SellerSortField, SellerStatus};
use crate::shared::error::AppError;
use crate::shared::pagination::{CursorPage, PageRequest, SortOrder};
use crate::shared::snowflake::SnowflakeGenerator;

/// Seller service trait
#[async_trait]
pub trait SellerService: Send + Sync {
    /// List sellers with filters and cursor pagination
    async fn list_sellers(
        &self,
        params: SellerListParams,
    ) -> Result<CursorPage<Seller>, SellerError>;

    /// Get seller by ID
    async fn get_seller(&self, seller_id: i64) -> Result<Seller, SellerError>;

    /// Onboard a new seller
    async fn create_seller(&self, dto: CreateSellerDto) -> Result<Seller, SellerError>;

    /// Update profile fields and commission rate
    async fn update_seller(
        &self,
        seller_id: i64,
        dto: UpdateSellerDto,
    ) -> Result<Seller, SellerError>;

    /// Transition the seller status
    async fn update_status(
        &self,
        seller_id: i64,
        next: SellerStatus,
    ) -> Result<Seller, SellerError>;
}

/// List request parameters
#[derive(Debug, Clone, Default)]
pub struct SellerListParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filter: SellerFilter,
}

/// Create seller request
#[derive(Debug, Clone)]
pub struct CreateSellerDto {
    pub user_id: i64,
    pub display_name: String,
    pub commission_rate: Decimal,
}

/// Update seller request
#[derive(Debug, Clone, Default)]
pub struct UpdateSellerDto {
    pub display_name: Option<String>,
    pub commission_rate: Option<Decimal>,
}

/// Seller service errors
#[derive(Debug, thiserror::Error)]
pub enum SellerError {
    #[error("Seller not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SellerError {
    fn from_repo(e: AppError) -> Self {
        match e {
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

fn validate_commission_rate(rate: Decimal) -> Result<(), SellerError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(SellerError::Validation(
            "Commission rate must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

/// SellerService implementation
pub struct SellerServiceImpl<R>
where
    R: SellerRepository,
{
    seller_repo: Arc<R>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<R> SellerServiceImpl<R>
where
    R: SellerRepository,
{
    pub fn new(seller_repo: Arc<R>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            seller_repo,
            id_generator,
        }
    }
}

#[async_trait]
impl<R> SellerService for SellerServiceImpl<R>
where
    R: SellerRepository + 'static,
{
    async fn list_sellers(
        &self,
        params: SellerListParams,
    ) -> Result<CursorPage<Seller>, SellerError> {
        let sort = match params.sort_by.as_deref() {
            Some(name) => SellerSortField::parse(name)
                .ok_or_else(|| SellerError::Validation(format!("Unknown sort field: {}", name)))?,
            None => SellerSortField::default(),
        };

        let page =
            PageRequest::from_parts(params.cursor.as_deref(), params.limit, params.sort_order);

        let rows = self
            .seller_repo
            .list(&params.filter, sort, &page)
            .await
            .map_err(SellerError::from_repo)?;

        Ok(CursorPage::assemble(rows, &page, |s| sort.cursor_value(s)))
    }

    async fn get_seller(&self, seller_id: i64) -> Result<Seller, SellerError> {
        self.seller_repo
            .find_by_id(seller_id)
            .await
            .map_err(SellerError::from_repo)?
            .ok_or(SellerError::NotFound)
    }

    async fn create_seller(&self, dto: CreateSellerDto) -> Result<Seller, SellerError> {
        validate_commission_rate(dto.commission_rate)?;

        // One seller per user account; the unique index is the backstop.
        let exists = self
            .seller_repo
            .user_exists(dto.user_id)
            .await
            .map_err(SellerError::from_repo)?;
        if exists {
            return Err(SellerError::Conflict(format!(
                "Seller for user {} already exists",
                dto.user_id
            )));
        }

        let now = Utc::now();
        let seller = Seller {
            id: self.id_generator.generate(),
            user_id: dto.user_id,
            display_name: dto.display_name,
            status: SellerStatus::PendingReview,
            commission_rate: dto.commission_rate,
            total_sales: 0,
            total_revenue: Decimal::ZERO,
            average_rating: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };

        self.seller_repo
            .create(&seller)
            .await
            .map_err(SellerError::from_repo)
    }

    async fn update_seller(
        &self,
        seller_id: i64,
        dto: UpdateSellerDto,
    ) -> Result<Seller, SellerError> {
        let mut seller = self
            .seller_repo
            .find_by_id(seller_id)
            .await
            .map_err(SellerError::from_repo)?
            .ok_or(SellerError::NotFound)?;

        if let Some(display_name) = dto.display_name {
            seller.display_name = display_name;
        }
        if let Some(rate) = dto.commission_rate {
            validate_commission_rate(rate)?;
            seller.commission_rate = rate;
        }

        self.seller_repo
            .update(&seller)
            .await
            .map_err(SellerError::from_repo)
    }

    async fn update_status(
        &self,
        seller_id: i64,
        next: SellerStatus,
    ) -> Result<Seller, SellerError> {
        let mut seller = self
            .seller_repo
            .find_by_id(seller_id)
            .await
            .map_err(SellerError::from_repo)?
            .ok_or(SellerError::NotFound)?;

        if !seller.status.can_transition_to(next) {
            return Err(SellerError::Conflict(format!(
                "Cannot transition seller from {} to {}",
                seller.status, next
            )));
        }

        self.seller_repo
            .update_status(seller_id, next)
            .await
            .map_err(SellerError::from_repo)?;

        seller.status = next;
        Ok(seller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockSellerRepository;
    use rust_decimal_macros::dec;

    fn sample_seller(id: i64, status: SellerStatus) -> Seller {
        let now = Utc::now();
        Seller {
            id,
            user_id: 42,
            display_name: "Studio North".to_string(),
            status,
            commission_rate: dec!(20),
            total_sales: 0,
            total_revenue: Decimal::ZERO,
            average_rating: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    fn sellers(repo: MockSellerRepository) -> SellerServiceImpl<MockSellerRepository> {
        SellerServiceImpl::new(Arc::new(repo), Arc::new(SnowflakeGenerator::new(1, 0)))
    }

    #[tokio::test]
    async fn test_create_duplicate_user_conflicts() {
        let mut repo = MockSellerRepository::new();
        repo.expect_user_exists().returning(|_| Ok(true));

        let dto = CreateSellerDto {
            user_id: 42,
            display_name: "Studio North".to_string(),
            commission_rate: dec!(20),
        };

        let result = sellers(repo).create_seller(dto).await;
        assert!(matches!(result, Err(SellerError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_commission() {
        let repo = MockSellerRepository::new();

        let dto = CreateSellerDto {
            user_id: 42,
            display_name: "Studio North".to_string(),
            commission_rate: dec!(101),
        };

        let result = sellers(repo).create_seller(dto).await;
        assert!(matches!(result, Err(SellerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_approve_pending_seller() {
        let mut repo = MockSellerRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_seller(id, SellerStatus::PendingReview))));
        repo.expect_update_status().returning(|_, _| Ok(()));

        let seller = sellers(repo)
            .update_status(1, SellerStatus::Approved)
            .await
            .unwrap();
        assert_eq!(seller.status, SellerStatus::Approved);
    }

    #[tokio::test]
    async fn test_rejected_seller_is_terminal() {
        let mut repo = MockSellerRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_seller(id, SellerStatus::Rejected))));

        let result = sellers(repo).update_status(1, SellerStatus::Approved).await;
        assert!(matches!(result, Err(SellerError::Conflict(_))));
    }
}
