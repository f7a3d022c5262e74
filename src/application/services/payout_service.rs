//! Payout Service
//!
//! Derives seller payouts from gross sales and the seller's commission rate,
//! and drives the payout status lifecycle. Amount fields are immutable once
//! the payout row exists.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::domain::{
    Payout, PayoutFilter, PayoutRepository, PayoutSortField, PayoutStatus, SellerRepository,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{CursorPage, PageRequest, SortOrder};
use crate::shared::snowflake::SnowflakeGenerator;

/// Commission retained by the platform for a gross amount.
///
/// `fee = amount * rate / 100`, rounded half-up to currency precision.
pub fn platform_fee(amount: Decimal, commission_rate: Decimal) -> Decimal {
    (amount * commission_rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Payout service trait
#[async_trait]
pub trait PayoutService: Send + Sync {
    /// List payouts with filters and cursor pagination
    async fn list_payouts(
        &self,
        params: PayoutListParams,
    ) -> Result<CursorPage<Payout>, PayoutError>;

    /// Get payout by ID
    async fn get_payout(&self, payout_id: i64) -> Result<Payout, PayoutError>;

    /// Create a payout for a seller's sales period
    async fn create_payout(&self, dto: CreatePayoutDto) -> Result<Payout, PayoutError>;

    /// Advance the payout lifecycle
    async fn transition_status(
        &self,
        payout_id: i64,
        next: PayoutStatus,
        failure_reason: Option<String>,
    ) -> Result<Payout, PayoutError>;
}

/// List request parameters
#[derive(Debug, Clone, Default)]
pub struct PayoutListParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filter: PayoutFilter,
}

/// Create payout request
#[derive(Debug, Clone)]
pub struct CreatePayoutDto {
    pub seller_id: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Gross sales amount for the period
    pub amount: Decimal,
    pub item_count: i32,
}

/// Payout service errors
#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("Payout not found")]
    NotFound,

    #[error("Seller not found")]
    SellerNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PayoutError {
    fn from_repo(e: AppError) -> Self {
        match e {
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// PayoutService implementation
pub struct PayoutServiceImpl<P, S>
where
    P: PayoutRepository,
    S: SellerRepository,
{
    payout_repo: Arc<P>,
    seller_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<P, S> PayoutServiceImpl<P, S>
where
    P: PayoutRepository,
    S: SellerRepository,
{
    pub fn new(
        payout_repo: Arc<P>,
        seller_repo: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            payout_repo,
            seller_repo,
            id_generator,
        }
    }
}

#[async_trait]
impl<P, S> PayoutService for PayoutServiceImpl<P, S>
where
    P: PayoutRepository + 'static,
    S: SellerRepository + 'static,
{
    async fn list_payouts(
        &self,
        params: PayoutListParams,
    ) -> Result<CursorPage<Payout>, PayoutError> {
        let sort = match params.sort_by.as_deref() {
            Some(name) => PayoutSortField::parse(name)
                .ok_or_else(|| PayoutError::Validation(format!("Unknown sort field: {}", name)))?,
            None => PayoutSortField::default(),
        };

        let page =
            PageRequest::from_parts(params.cursor.as_deref(), params.limit, params.sort_order);

        let rows = self
            .payout_repo
            .list(&params.filter, sort, &page)
            .await
            .map_err(PayoutError::from_repo)?;

        Ok(CursorPage::assemble(rows, &page, |p| sort.cursor_value(p)))
    }

    async fn get_payout(&self, payout_id: i64) -> Result<Payout, PayoutError> {
        self.payout_repo
            .find_by_id(payout_id)
            .await
            .map_err(PayoutError::from_repo)?
            .ok_or(PayoutError::NotFound)
    }

    async fn create_payout(&self, dto: CreatePayoutDto) -> Result<Payout, PayoutError> {
        if dto.amount < Decimal::ZERO {
            return Err(PayoutError::Validation("Amount cannot be negative".into()));
        }
        if dto.item_count < 0 {
            return Err(PayoutError::Validation("Item count cannot be negative".into()));
        }
        if dto.period_end <= dto.period_start {
            return Err(PayoutError::Validation(
                "Period end must be after period start".into(),
            ));
        }

        let seller = self
            .seller_repo
            .find_by_id(dto.seller_id)
            .await
            .map_err(PayoutError::from_repo)?
            .ok_or(PayoutError::SellerNotFound)?;

        if !seller.is_payable() {
            return Err(PayoutError::Validation(format!(
                "Seller {} is not approved for payouts",
                seller.id
            )));
        }

        // The commission rate is captured at creation time; later rate
        // changes never retroactively alter a payout.
        let amount = dto
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let fee = platform_fee(amount, seller.commission_rate);
        let net_amount = amount - fee;

        let now = Utc::now();
        let payout = Payout {
            id: self.id_generator.generate(),
            seller_id: seller.id,
            reference: Uuid::new_v4(),
            period_start: dto.period_start,
            period_end: dto.period_end,
            amount,
            platform_fee: fee,
            net_amount,
            item_count: dto.item_count,
            status: PayoutStatus::Pending,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.payout_repo
            .create(&payout)
            .await
            .map_err(PayoutError::from_repo)
    }

    async fn transition_status(
        &self,
        payout_id: i64,
        next: PayoutStatus,
        failure_reason: Option<String>,
    ) -> Result<Payout, PayoutError> {
        let mut payout = self
            .payout_repo
            .find_by_id(payout_id)
            .await
            .map_err(PayoutError::from_repo)?
            .ok_or(PayoutError::NotFound)?;

        if !payout.status.can_transition_to(next) {
            return Err(PayoutError::Conflict(format!(
                "Cannot transition payout from {} to {}",
                payout.status, next
            )));
        }

        let failure_reason = match next {
            PayoutStatus::Failed => {
                let reason = failure_reason
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| {
                        PayoutError::Validation(
                            "A failure reason is required when failing a payout".into(),
                        )
                    })?;
                Some(reason)
            }
            _ => None,
        };

        self.payout_repo
            .update_status(payout_id, next, failure_reason.clone())
            .await
            .map_err(PayoutError::from_repo)?;

        payout.status = next;
        payout.failure_reason = failure_reason;
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockPayoutRepository, MockSellerRepository, Seller, SellerStatus};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn approved_seller(id: i64, rate: Decimal) -> Seller {
        let now = Utc::now();
        Seller {
            id,
            user_id: 42,
            display_name: "Studio North".to_string(),
            status: SellerStatus::Approved,
            commission_rate: rate,
            total_sales: 0,
            total_revenue: Decimal::ZERO,
            average_rating: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_payout(id: i64, status: PayoutStatus) -> Payout {
        let now = Utc::now();
        Payout {
            id,
            seller_id: 1,
            reference: Uuid::new_v4(),
            period_start: now - chrono::Duration::days(30),
            period_end: now,
            amount: dec!(1000.00),
            platform_fee: dec!(200.00),
            net_amount: dec!(800.00),
            item_count: 12,
            status,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payouts(
        payout_repo: MockPayoutRepository,
        seller_repo: MockSellerRepository,
    ) -> PayoutServiceImpl<MockPayoutRepository, MockSellerRepository> {
        PayoutServiceImpl::new(
            Arc::new(payout_repo),
            Arc::new(seller_repo),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        )
    }

    #[test_case(dec!(1000.00), dec!(20), dec!(200.00), dec!(800.00))]
    #[test_case(dec!(99.99), dec!(10), dec!(10.00), dec!(89.99); "rounds half up")]
    #[test_case(dec!(0.01), dec!(20), dec!(0.00), dec!(0.01))]
    #[test_case(dec!(150.00), dec!(0), dec!(0.00), dec!(150.00); "zero rate")]
    #[test_case(dec!(150.00), dec!(100), dec!(150.00), dec!(0.00); "full rate")]
    fn test_platform_fee_arithmetic(
        amount: Decimal,
        rate: Decimal,
        expected_fee: Decimal,
        expected_net: Decimal,
    ) {
        let fee = platform_fee(amount, rate);
        assert_eq!(fee, expected_fee);
        assert_eq!(amount - fee, expected_net);
        // The invariant holds for every generated payout.
        assert_eq!(amount, fee + (amount - fee));
    }

    #[tokio::test]
    async fn test_create_payout_captures_commission_split() {
        let mut seller_repo = MockSellerRepository::new();
        seller_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(approved_seller(id, dec!(20)))));

        let mut payout_repo = MockPayoutRepository::new();
        payout_repo.expect_create().returning(|p| Ok(p.clone()));

        let now = Utc::now();
        let dto = CreatePayoutDto {
            seller_id: 1,
            period_start: now - chrono::Duration::days(30),
            period_end: now,
            amount: dec!(1000.00),
            item_count: 12,
        };

        let payout = payouts(payout_repo, seller_repo)
            .create_payout(dto)
            .await
            .unwrap();

        assert_eq!(payout.platform_fee, dec!(200.00));
        assert_eq!(payout.net_amount, dec!(800.00));
        assert!(payout.amounts_balance());
        assert_eq!(payout.status, PayoutStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_payout_for_unapproved_seller_rejected() {
        let mut seller_repo = MockSellerRepository::new();
        seller_repo.expect_find_by_id().returning(|id| {
            let mut seller = approved_seller(id, dec!(20));
            seller.status = SellerStatus::Suspended;
            Ok(Some(seller))
        });

        let now = Utc::now();
        let dto = CreatePayoutDto {
            seller_id: 1,
            period_start: now - chrono::Duration::days(30),
            period_end: now,
            amount: dec!(1000.00),
            item_count: 12,
        };

        let result = payouts(MockPayoutRepository::new(), seller_repo)
            .create_payout(dto)
            .await;
        assert!(matches!(result, Err(PayoutError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failing_requires_reason() {
        let mut payout_repo = MockPayoutRepository::new();
        payout_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_payout(id, PayoutStatus::Processing))));

        let result = payouts(payout_repo, MockSellerRepository::new())
            .transition_status(1, PayoutStatus::Failed, None)
            .await;
        assert!(matches!(result, Err(PayoutError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_payout_accepts_no_further_transitions() {
        let mut payout_repo = MockPayoutRepository::new();
        payout_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_payout(id, PayoutStatus::Failed))));

        let result = payouts(payout_repo, MockSellerRepository::new())
            .transition_status(1, PayoutStatus::Processing, None)
            .await;
        assert!(matches!(result, Err(PayoutError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_complete_processing_payout() {
        let mut payout_repo = MockPayoutRepository::new();
        payout_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_payout(id, PayoutStatus::Processing))));
        payout_repo
            .expect_update_status()
            .withf(|_, status, reason| *status == PayoutStatus::Completed && reason.is_none())
            .returning(|_, _, _| Ok(()));

        let payout = payouts(payout_repo, MockSellerRepository::new())
            .transition_status(1, PayoutStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(payout.status, PayoutStatus::Completed);
    }
}
