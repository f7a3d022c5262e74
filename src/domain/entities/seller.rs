//! Seller entity and repository trait.
//!
//! Maps to the `sellers` table. The aggregate counters (`total_sales`,
//! `total_revenue`, `average_rating`) are externally-owned projections:
//! they are read and returned but never recomputed here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Seller account statuses matching the `status` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SellerStatus {
    /// Awaiting manual review after onboarding
    #[default]
    PendingReview,
    /// Allowed to sell
    Approved,
    /// Temporarily barred from selling
    Suspended,
    /// Onboarding rejected; terminal
    Rejected,
}

impl SellerStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pending_review" => Self::PendingReview,
            "approved" => Self::Approved,
            "suspended" => Self::Suspended,
            "rejected" => Self::Rejected,
            _ => Self::PendingReview,
        }
    }

    /// Strict parse for client-supplied values; None for unknown names.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "pending_review" => Some(Self::PendingReview),
            "approved" => Some(Self::Approved),
            "suspended" => Some(Self::Suspended),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Suspended => "suspended",
            Self::Rejected => "rejected",
        }
    }

    /// Whether a transition to `next` is allowed.
    ///
    /// pending_review -> approved | rejected
    /// approved -> suspended
    /// suspended -> approved
    /// rejected is terminal.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingReview, Self::Approved)
                | (Self::PendingReview, Self::Rejected)
                | (Self::Approved, Self::Suspended)
                | (Self::Suspended, Self::Approved)
        )
    }
}

impl std::fmt::Display for SellerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a seller account on the platform.
///
/// Maps to the `sellers` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - user_id: BIGINT NOT NULL UNIQUE -- external identity, one-to-one
/// - display_name: VARCHAR(120) NOT NULL
/// - status: TEXT NOT NULL DEFAULT 'pending_review'
/// - commission_rate: NUMERIC(5,2) NOT NULL -- percent retained by platform
/// - total_sales: BIGINT NOT NULL DEFAULT 0
/// - total_revenue: NUMERIC(14,2) NOT NULL DEFAULT 0
/// - average_rating: NUMERIC(3,2) NOT NULL DEFAULT 0
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// External user account (one-to-one)
    pub user_id: i64,

    /// Public display name
    pub display_name: String,

    /// Account status
    pub status: SellerStatus,

    /// Percentage of gross sale amount retained by the platform (0-100)
    pub commission_rate: Decimal,

    /// Lifetime completed sales count (external projection)
    pub total_sales: i64,

    /// Lifetime gross revenue (external projection)
    pub total_revenue: Decimal,

    /// Average review rating (external projection)
    pub average_rating: Decimal,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Seller {
    /// Whether this seller can currently receive payouts.
    pub fn is_payable(&self) -> bool {
        self.status == SellerStatus::Approved
    }
}

/// Allow-listed sortable columns for seller list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SellerSortField {
    #[default]
    CreatedAt,
    TotalRevenue,
    TotalSales,
    AverageRating,
}

impl SellerSortField {
    /// Resolve a client-supplied sort name. Returns None for unknown fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "totalRevenue" | "total_revenue" => Some(Self::TotalRevenue),
            "totalSales" | "total_sales" => Some(Self::TotalSales),
            "averageRating" | "average_rating" => Some(Self::AverageRating),
            _ => None,
        }
    }

    /// Column reference for ORDER BY and the cursor predicate.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::TotalRevenue => "total_revenue",
            Self::TotalSales => "total_sales",
            Self::AverageRating => "average_rating",
        }
    }

    /// Sort-field value of a row, as encoded into the next-page cursor.
    pub fn cursor_value(&self, seller: &Seller) -> Value {
        match self {
            Self::CreatedAt => json!(seller.created_at.to_rfc3339()),
            Self::TotalRevenue => json!(seller.total_revenue.to_f64().unwrap_or_default()),
            Self::TotalSales => json!(seller.total_sales),
            Self::AverageRating => json!(seller.average_rating.to_f64().unwrap_or_default()),
        }
    }
}

/// Optional filters for seller list queries.
#[derive(Debug, Clone, Default)]
pub struct SellerFilter {
    /// Case-insensitive substring match over the display name
    pub search: Option<String>,
    pub status: Option<SellerStatus>,
}

/// Repository trait for Seller data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SellerRepository: Send + Sync {
    /// Find a seller by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Seller>, AppError>;

    /// Find a seller by the external user account.
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Seller>, AppError>;

    /// List sellers matching the filter, cursor-paginated.
    async fn list(
        &self,
        filter: &SellerFilter,
        sort: SellerSortField,
        page: &PageRequest,
    ) -> Result<Vec<Seller>, AppError>;

    /// Check whether a user account already has a seller row.
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError>;

    /// Insert a new seller.
    async fn create(&self, seller: &Seller) -> Result<Seller, AppError>;

    /// Update profile fields and commission rate.
    async fn update(&self, seller: &Seller) -> Result<Seller, AppError>;

    /// Update only the status column.
    async fn update_status(&self, id: i64, status: SellerStatus) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(SellerStatus::PendingReview, SellerStatus::Approved, true)]
    #[test_case(SellerStatus::PendingReview, SellerStatus::Rejected, true)]
    #[test_case(SellerStatus::Approved, SellerStatus::Suspended, true)]
    #[test_case(SellerStatus::Suspended, SellerStatus::Approved, true)]
    #[test_case(SellerStatus::Rejected, SellerStatus::Approved, false)]
    #[test_case(SellerStatus::Approved, SellerStatus::PendingReview, false)]
    #[test_case(SellerStatus::Suspended, SellerStatus::Rejected, false)]
    #[test_case(SellerStatus::Approved, SellerStatus::Approved, false)]
    fn test_status_transitions(from: SellerStatus, to: SellerStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            SellerStatus::PendingReview,
            SellerStatus::Approved,
            SellerStatus::Suspended,
            SellerStatus::Rejected,
        ] {
            assert_eq!(SellerStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!(
            SellerSortField::parse("totalRevenue"),
            Some(SellerSortField::TotalRevenue)
        );
        assert_eq!(SellerSortField::parse("commission_rate"), None);
        assert_eq!(SellerSortField::parse("user_id"), None);
    }
}
