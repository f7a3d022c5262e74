//! Payout entity and repository trait.
//!
//! Maps to the `payouts` table. A payout is immutable after creation except
//! for its status column, which follows a linear lifecycle with no
//! back-transitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Payout statuses matching the `status` CHECK constraint.
///
/// Lifecycle: pending -> processing -> (completed | failed).
/// Both end states are terminal; there is no retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Strict parse for client-supplied values; None for unknown names.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether a transition to `next` is allowed.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Whether this status accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a seller payout for a sales period.
///
/// Maps to the `payouts` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - seller_id: BIGINT NOT NULL REFERENCES sellers(id)
/// - reference: UUID NOT NULL -- provider reconciliation handle
/// - period_start / period_end: TIMESTAMPTZ NOT NULL
/// - amount: NUMERIC(12,2) NOT NULL -- gross
/// - platform_fee: NUMERIC(12,2) NOT NULL
/// - net_amount: NUMERIC(12,2) NOT NULL -- amount - platform_fee
/// - item_count: INTEGER NOT NULL
/// - status: TEXT NOT NULL DEFAULT 'pending'
/// - failure_reason: TEXT NULL -- required when status = 'failed'
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Seller receiving this payout
    pub seller_id: i64,

    /// Opaque handle passed to the payment provider
    pub reference: Uuid,

    /// Start of the covered sales period
    pub period_start: DateTime<Utc>,

    /// End of the covered sales period
    pub period_end: DateTime<Utc>,

    /// Gross sales amount for the period
    pub amount: Decimal,

    /// Commission retained by the platform
    pub platform_fee: Decimal,

    /// Amount transferred to the seller
    pub net_amount: Decimal,

    /// Number of sale items covered
    pub item_count: i32,

    /// Lifecycle status
    pub status: PayoutStatus,

    /// Human-readable reason, set when the payout failed
    pub failure_reason: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    /// Verify the arithmetic invariant `amount = platform_fee + net_amount`.
    pub fn amounts_balance(&self) -> bool {
        self.amount == self.platform_fee + self.net_amount
    }
}

/// Allow-listed sortable columns for payout list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayoutSortField {
    #[default]
    CreatedAt,
    Amount,
    PeriodStart,
}

impl PayoutSortField {
    /// Resolve a client-supplied sort name. Returns None for unknown fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "amount" => Some(Self::Amount),
            "periodStart" | "period_start" => Some(Self::PeriodStart),
            _ => None,
        }
    }

    /// Column reference for ORDER BY and the cursor predicate.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Amount => "amount",
            Self::PeriodStart => "period_start",
        }
    }

    /// Sort-field value of a row, as encoded into the next-page cursor.
    pub fn cursor_value(&self, payout: &Payout) -> Value {
        match self {
            Self::CreatedAt => json!(payout.created_at.to_rfc3339()),
            Self::Amount => json!(payout.amount.to_f64().unwrap_or_default()),
            Self::PeriodStart => json!(payout.period_start.to_rfc3339()),
        }
    }
}

/// Optional filters for payout list queries.
#[derive(Debug, Clone, Default)]
pub struct PayoutFilter {
    pub seller_id: Option<i64>,
    pub status: Option<PayoutStatus>,
}

/// Repository trait for Payout data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayoutRepository: Send + Sync {
    /// Find a payout by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Payout>, AppError>;

    /// List payouts matching the filter, cursor-paginated.
    async fn list(
        &self,
        filter: &PayoutFilter,
        sort: PayoutSortField,
        page: &PageRequest,
    ) -> Result<Vec<Payout>, AppError>;

    /// Insert a new payout.
    async fn create(&self, payout: &Payout) -> Result<Payout, AppError>;

    /// Update only the status column (and failure reason, when failing).
    async fn update_status(
        &self,
        id: i64,
        status: PayoutStatus,
        failure_reason: Option<String>,
    ) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(PayoutStatus::Pending, PayoutStatus::Processing, true)]
    #[test_case(PayoutStatus::Processing, PayoutStatus::Completed, true)]
    #[test_case(PayoutStatus::Processing, PayoutStatus::Failed, true)]
    #[test_case(PayoutStatus::Pending, PayoutStatus::Completed, false; "no skipping processing")]
    #[test_case(PayoutStatus::Completed, PayoutStatus::Pending, false; "completed is terminal")]
    #[test_case(PayoutStatus::Failed, PayoutStatus::Pending, false; "failed is terminal")]
    #[test_case(PayoutStatus::Failed, PayoutStatus::Processing, false; "no retry loop")]
    #[test_case(PayoutStatus::Processing, PayoutStatus::Pending, false; "no back-transitions")]
    fn test_status_transitions(from: PayoutStatus, to: PayoutStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!PayoutStatus::Pending.is_terminal());
        assert!(!PayoutStatus::Processing.is_terminal());
        assert!(PayoutStatus::Completed.is_terminal());
        assert!(PayoutStatus::Failed.is_terminal());
    }

    #[test]
    fn test_amounts_balance() {
        let now = Utc::now();
        let payout = Payout {
            id: 1,
            seller_id: 2,
            reference: Uuid::new_v4(),
            period_start: now,
            period_end: now,
            amount: dec!(1000.00),
            platform_fee: dec!(200.00),
            net_amount: dec!(800.00),
            item_count: 12,
            status: PayoutStatus::Pending,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        assert!(payout.amounts_balance());

        let skewed = Payout {
            net_amount: dec!(799.99),
            ..payout
        };
        assert!(!skewed.amounts_balance());
    }
}
