//! Subscription Service
//!
//! Handles credit subscriptions and their balance ledger. Every balance
//! change produces an append-only ledger entry; debits that would overdraw
//! the balance are rejected before any write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    CreditEntry, Subscription, SubscriptionFilter, SubscriptionPlan, SubscriptionRepository,
    SubscriptionSortField, SubscriptionStatus,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{CursorPage, PageRequest, SortOrder};
use crate::shared::snowflake::SnowflakeGenerator;

/// Subscription service trait
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// List subscriptions with filters and cursor pagination
    async fn list_subscriptions(
        &self,
        params: SubscriptionListParams,
    ) -> Result<CursorPage<Subscription>, SubscriptionError>;

    /// Get subscription by ID
    async fn get_subscription(&self, subscription_id: i64)
        -> Result<Subscription, SubscriptionError>;

    /// Open a subscription for a user
    async fn create_subscription(
        &self,
        dto: CreateSubscriptionDto,
    ) -> Result<Subscription, SubscriptionError>;

    /// Cancel an active subscription
    async fn cancel_subscription(
        &self,
        subscription_id: i64,
    ) -> Result<Subscription, SubscriptionError>;

    /// Apply a signed credit delta with its ledger entry
    async fn adjust_credits(
        &self,
        subscription_id: i64,
        dto: CreditAdjustmentDto,
    ) -> Result<(Subscription, CreditEntry), SubscriptionError>;

    /// List ledger entries for a subscription
    async fn list_credit_entries(
        &self,
        subscription_id: i64,
        cursor: Option<String>,
        limit: Option<i64>,
    ) -> Result<CursorPage<CreditEntry>, SubscriptionError>;
}

/// List request parameters
#[derive(Debug, Clone, Default)]
pub struct SubscriptionListParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filter: SubscriptionFilter,
}

/// Create subscription request
#[derive(Debug, Clone)]
pub struct CreateSubscriptionDto {
    pub user_id: i64,
    pub plan: SubscriptionPlan,
}

/// Credit adjustment request
#[derive(Debug, Clone)]
pub struct CreditAdjustmentDto {
    /// Signed delta; positive grants, negative spends
    pub amount: i32,
    pub reason: String,
}

/// Subscription service errors
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Subscription not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubscriptionError {
    fn from_repo(e: AppError) -> Self {
        match e {
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::Validation(msg) => Self::Validation(msg),
            AppError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// SubscriptionService implementation
pub struct SubscriptionServiceImpl<R>
where
    R: SubscriptionRepository,
{
    subscription_repo: Arc<R>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<R> SubscriptionServiceImpl<R>
where
    R: SubscriptionRepository,
{
    pub fn new(subscription_repo: Arc<R>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            subscription_repo,
            id_generator,
        }
    }
}

#[async_trait]
impl<R> SubscriptionService for SubscriptionServiceImpl<R>
where
    R: SubscriptionRepository + 'static,
{
    async fn list_subscriptions(
        &self,
        params: SubscriptionListParams,
    ) -> Result<CursorPage<Subscription>, SubscriptionError> {
        let sort = match params.sort_by.as_deref() {
            Some(name) => SubscriptionSortField::parse(name).ok_or_else(|| {
                SubscriptionError::Validation(format!("Unknown sort field: {}", name))
            })?,
            None => SubscriptionSortField::default(),
        };

        let page =
            PageRequest::from_parts(params.cursor.as_deref(), params.limit, params.sort_order);

        let rows = self
            .subscription_repo
            .list(&params.filter, sort, &page)
            .await
            .map_err(SubscriptionError::from_repo)?;

        Ok(CursorPage::assemble(rows, &page, |s| sort.cursor_value(s)))
    }

    async fn get_subscription(
        &self,
        subscription_id: i64,
    ) -> Result<Subscription, SubscriptionError> {
        self.subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(SubscriptionError::from_repo)?
            .ok_or(SubscriptionError::NotFound)
    }

    async fn create_subscription(
        &self,
        dto: CreateSubscriptionDto,
    ) -> Result<Subscription, SubscriptionError> {
        let exists = self
            .subscription_repo
            .user_exists(dto.user_id)
            .await
            .map_err(SubscriptionError::from_repo)?;
        if exists {
            return Err(SubscriptionError::Conflict(format!(
                "Subscription for user {} already exists",
                dto.user_id
            )));
        }

        let now = Utc::now();
        let subscription = Subscription {
            id: self.id_generator.generate(),
            user_id: dto.user_id,
            plan: dto.plan,
            credits: dto.plan.initial_credits(),
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let opening_entry_id = self.id_generator.generate();
        self.subscription_repo
            .create(&subscription, opening_entry_id)
            .await
            .map_err(SubscriptionError::from_repo)
    }

    async fn cancel_subscription(
        &self,
        subscription_id: i64,
    ) -> Result<Subscription, SubscriptionError> {
        let mut subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(SubscriptionError::from_repo)?
            .ok_or(SubscriptionError::NotFound)?;

        if subscription.status != SubscriptionStatus::Active {
            return Err(SubscriptionError::Conflict(format!(
                "Subscription is already {}",
                subscription.status.as_str()
            )));
        }

        self.subscription_repo
            .update_status(subscription_id, SubscriptionStatus::Canceled)
            .await
            .map_err(SubscriptionError::from_repo)?;

        subscription.status = SubscriptionStatus::Canceled;
        Ok(subscription)
    }

    async fn adjust_credits(
        &self,
        subscription_id: i64,
        dto: CreditAdjustmentDto,
    ) -> Result<(Subscription, CreditEntry), SubscriptionError> {
        if dto.amount == 0 {
            return Err(SubscriptionError::Validation(
                "Credit adjustment cannot be zero".into(),
            ));
        }
        if dto.reason.trim().is_empty() {
            return Err(SubscriptionError::Validation(
                "A reason is required for credit adjustments".into(),
            ));
        }

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(SubscriptionError::from_repo)?
            .ok_or(SubscriptionError::NotFound)?;

        if subscription.status != SubscriptionStatus::Active {
            return Err(SubscriptionError::Conflict(
                "Credits can only be adjusted on an active subscription".into(),
            ));
        }

        // Fast-feedback overdraft check; the CHECK constraint catches
        // concurrent spends the pre-read cannot see.
        if dto.amount < 0 && subscription.credits + dto.amount < 0 {
            return Err(SubscriptionError::Validation("Insufficient credits".into()));
        }

        let entry_id = self.id_generator.generate();
        self.subscription_repo
            .apply_credit_delta(subscription_id, entry_id, dto.amount, &dto.reason)
            .await
            .map_err(SubscriptionError::from_repo)
    }

    async fn list_credit_entries(
        &self,
        subscription_id: i64,
        cursor: Option<String>,
        limit: Option<i64>,
    ) -> Result<CursorPage<CreditEntry>, SubscriptionError> {
        // Ledger reads 404 on unknown subscriptions rather than returning an
        // empty page.
        self.subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(SubscriptionError::from_repo)?
            .ok_or(SubscriptionError::NotFound)?;

        // Ledger pages read newest-first by default.
        let page = PageRequest::from_parts(cursor.as_deref(), limit, Some(SortOrder::Desc));

        let rows = self
            .subscription_repo
            .list_entries(subscription_id, &page)
            .await
            .map_err(SubscriptionError::from_repo)?;

        Ok(CursorPage::assemble(rows, &page, |e| {
            serde_json::json!(e.created_at.to_rfc3339())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockSubscriptionRepository;
    use pretty_assertions::assert_eq;

    fn active_subscription(id: i64, credits: i32) -> Subscription {
        let now = Utc::now();
        Subscription {
            id,
            user_id: 42,
            plan: SubscriptionPlan::Growth,
            credits,
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn subscriptions(
        repo: MockSubscriptionRepository,
    ) -> SubscriptionServiceImpl<MockSubscriptionRepository> {
        SubscriptionServiceImpl::new(Arc::new(repo), Arc::new(SnowflakeGenerator::new(1, 0)))
    }

    #[tokio::test]
    async fn test_create_grants_plan_credits() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_user_exists().returning(|_| Ok(false));
        repo.expect_create().returning(|s, _| Ok(s.clone()));

        let dto = CreateSubscriptionDto {
            user_id: 42,
            plan: SubscriptionPlan::Growth,
        };

        let subscription = subscriptions(repo).create_subscription(dto).await.unwrap();
        assert_eq!(subscription.credits, 250);
        assert_eq!(subscription.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_create_duplicate_user_conflicts() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_user_exists().returning(|_| Ok(true));

        let dto = CreateSubscriptionDto {
            user_id: 42,
            plan: SubscriptionPlan::Starter,
        };

        let result = subscriptions(repo).create_subscription(dto).await;
        assert!(matches!(result, Err(SubscriptionError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_overdraft_rejected_without_writing() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(active_subscription(id, 10))));
        // No expectation on apply_credit_delta: a write attempt fails the test.

        let dto = CreditAdjustmentDto {
            amount: -11,
            reason: "listing_boost".to_string(),
        };

        let result = subscriptions(repo).adjust_credits(1, dto).await;
        assert!(matches!(result, Err(SubscriptionError::Validation(_))));
    }

    #[tokio::test]
    async fn test_spend_within_balance_applies() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(active_subscription(id, 10))));
        repo.expect_apply_credit_delta()
            .returning(|subscription_id, entry_id, amount, reason| {
                let subscription = active_subscription(subscription_id, 10 + amount);
                let entry = CreditEntry {
                    id: entry_id,
                    subscription_id,
                    amount,
                    balance_after: 10 + amount,
                    reason: reason.to_string(),
                    created_at: Utc::now(),
                };
                Ok((subscription, entry))
            });

        let dto = CreditAdjustmentDto {
            amount: -10,
            reason: "listing_boost".to_string(),
        };

        let (subscription, entry) = subscriptions(repo).adjust_credits(1, dto).await.unwrap();
        assert_eq!(subscription.credits, 0);
        assert_eq!(entry.balance_after, 0);
        assert_eq!(entry.amount, -10);
    }

    #[tokio::test]
    async fn test_cancel_twice_conflicts() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_by_id().returning(|id| {
            let mut s = active_subscription(id, 10);
            s.status = SubscriptionStatus::Canceled;
            Ok(Some(s))
        });

        let result = subscriptions(repo).cancel_subscription(1).await;
        assert!(matches!(result, Err(SubscriptionError::Conflict(_))));
    }
}
