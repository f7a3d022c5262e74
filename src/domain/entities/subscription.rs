//! Subscription and credit-ledger entities and repository trait.
//!
//! A subscription carries a current credit balance; every balance change is
//! recorded as an append-only `credit_entries` row written in the same
//! database transaction as the balance update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Subscription plans matching the `plan` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Starter,
    Growth,
    Scale,
}

impl SubscriptionPlan {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "starter" => Self::Starter,
            "growth" => Self::Growth,
            "scale" => Self::Scale,
            _ => Self::Starter,
        }
    }

    /// Strict parse for client-supplied values; None for unknown names.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "starter" => Some(Self::Starter),
            "growth" => Some(Self::Growth),
            "scale" => Some(Self::Scale),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Growth => "growth",
            Self::Scale => "scale",
        }
    }

    /// Credits granted when a subscription on this plan is opened.
    pub fn initial_credits(&self) -> i32 {
        match self {
            Self::Starter => 50,
            Self::Growth => 250,
            Self::Scale => 1000,
        }
    }
}

/// Subscription statuses matching the `status` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => Self::Active,
            "canceled" => Self::Canceled,
            "expired" => Self::Expired,
            _ => Self::Active,
        }
    }

    /// Strict parse for client-supplied values; None for unknown names.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "canceled" => Some(Self::Canceled),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
        }
    }
}

/// Represents a user's credit subscription.
///
/// Maps to the `subscriptions` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - user_id: BIGINT NOT NULL UNIQUE -- external identity
/// - plan: TEXT NOT NULL
/// - credits: INTEGER NOT NULL CHECK (credits >= 0)
/// - status: TEXT NOT NULL DEFAULT 'active'
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Subscribing user (external identity, one subscription per user)
    pub user_id: i64,

    /// Plan tier
    pub plan: SubscriptionPlan,

    /// Current credit balance
    pub credits: i32,

    /// Lifecycle status
    pub status: SubscriptionStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// One ledger line recording a credit balance change.
///
/// Maps to the append-only `credit_entries` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - subscription_id: BIGINT NOT NULL REFERENCES subscriptions(id)
/// - amount: INTEGER NOT NULL -- signed delta
/// - balance_after: INTEGER NOT NULL
/// - reason: TEXT NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditEntry {
    pub id: i64,
    pub subscription_id: i64,
    /// Signed delta; positive grants, negative spends
    pub amount: i32,
    /// Balance after applying this entry
    pub balance_after: i32,
    /// What caused the change (grant, spend, refund, ...)
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Allow-listed sortable columns for subscription list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionSortField {
    #[default]
    CreatedAt,
}

impl SubscriptionSortField {
    /// Resolve a client-supplied sort name. Returns None for unknown fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    /// Column reference for ORDER BY and the cursor predicate.
    pub fn column(&self) -> &'static str {
        "created_at"
    }

    /// Sort-field value of a row, as encoded into the next-page cursor.
    pub fn cursor_value(&self, subscription: &Subscription) -> Value {
        json!(subscription.created_at.to_rfc3339())
    }
}

/// Optional filters for subscription list queries.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub status: Option<SubscriptionStatus>,
    pub plan: Option<SubscriptionPlan>,
}

/// Repository trait for Subscription data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Subscription>, AppError>;

    /// Find a user's subscription.
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Subscription>, AppError>;

    /// List subscriptions matching the filter, cursor-paginated.
    async fn list(
        &self,
        filter: &SubscriptionFilter,
        sort: SubscriptionSortField,
        page: &PageRequest,
    ) -> Result<Vec<Subscription>, AppError>;

    /// Check whether a user account already has a subscription.
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError>;

    /// Insert a new subscription together with its opening ledger entry,
    /// in one transaction. `opening_entry_id` becomes the ledger row's ID.
    async fn create(
        &self,
        subscription: &Subscription,
        opening_entry_id: i64,
    ) -> Result<Subscription, AppError>;

    /// Update only the status column.
    async fn update_status(&self, id: i64, status: SubscriptionStatus) -> Result<(), AppError>;

    /// Apply a signed balance delta and append the ledger entry atomically.
    ///
    /// The row is locked for the read-modify-write; the `credits >= 0` CHECK
    /// constraint is the backstop against concurrent overdrafts, surfaced as
    /// a Validation error.
    async fn apply_credit_delta(
        &self,
        subscription_id: i64,
        entry_id: i64,
        amount: i32,
        reason: &str,
    ) -> Result<(Subscription, CreditEntry), AppError>;

    /// List ledger entries for a subscription, newest first, cursor-paginated.
    async fn list_entries(
        &self,
        subscription_id: i64,
        page: &PageRequest,
    ) -> Result<Vec<CreditEntry>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_initial_credits() {
        assert_eq!(SubscriptionPlan::Starter.initial_credits(), 50);
        assert_eq!(SubscriptionPlan::Growth.initial_credits(), 250);
        assert_eq!(SubscriptionPlan::Scale.initial_credits(), 1000);
    }

    #[test]
    fn test_plan_roundtrip() {
        for plan in [
            SubscriptionPlan::Starter,
            SubscriptionPlan::Growth,
            SubscriptionPlan::Scale,
        ] {
            assert_eq!(SubscriptionPlan::from_str(plan.as_str()), plan);
        }
    }

    #[test]
    fn test_unknown_sort_field_rejected() {
        assert_eq!(SubscriptionSortField::parse("credits"), None);
        assert_eq!(
            SubscriptionSortField::parse("createdAt"),
            Some(SubscriptionSortField::CreatedAt)
        );
    }
}
