//! Service (listing) entity and repository trait.
//!
//! Maps to the `services` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Service statuses matching the `status` CHECK constraint.
///
/// Database definition:
/// ```sql
/// status TEXT NOT NULL CHECK (status IN ('draft', 'active', 'inactive'))
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Not yet published; hidden from the storefront
    #[default]
    Draft,
    /// Published and purchasable
    Active,
    /// Unpublished by the seller or an admin
    Inactive,
}

impl ServiceStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "draft" => Self::Draft,
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            _ => Self::Draft,
        }
    }

    /// Strict parse for client-supplied values; None for unknown names.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a marketplace service listing.
///
/// Maps to the `services` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - slug: TEXT NOT NULL (unique among non-deleted rows)
/// - title: VARCHAR(160) NOT NULL
/// - description: TEXT NOT NULL
/// - price: NUMERIC(12,2) NOT NULL
/// - seller_id: BIGINT NOT NULL REFERENCES sellers(id)
/// - category_id: BIGINT REFERENCES service_categories(id) -- NULL allowed
/// - status: TEXT NOT NULL DEFAULT 'draft'
/// - sort_order: INTEGER NOT NULL DEFAULT 0
/// - is_featured: BOOLEAN NOT NULL DEFAULT FALSE
/// - deleted_at: TIMESTAMPTZ NULL -- soft delete marker
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// URL-safe unique identifier chosen at creation time
    pub slug: String,

    /// Listing title (1-160 characters)
    pub title: String,

    /// Listing description
    pub description: String,

    /// Gross price, currency precision (2 decimals)
    pub price: Decimal,

    /// Owning seller
    pub seller_id: i64,

    /// Optional category (None for uncategorized listings)
    pub category_id: Option<i64>,

    /// Publication status
    pub status: ServiceStatus,

    /// Manual ordering position, the default sort key
    pub sort_order: i32,

    /// Whether the listing is featured on the storefront
    pub is_featured: bool,

    /// Soft-delete marker; the row persists but is excluded from reads
    pub deleted_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Check whether this listing has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Allow-listed sortable columns for service list queries.
///
/// User-supplied `sortBy` names resolve through this enum; anything else is
/// rejected before reaching the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceSortField {
    #[default]
    Order,
    Title,
    Price,
    CreatedAt,
}

impl ServiceSortField {
    /// Resolve a client-supplied sort name. Returns None for unknown fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "order" => Some(Self::Order),
            "title" => Some(Self::Title),
            "price" => Some(Self::Price),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    /// Column reference for ORDER BY and the cursor predicate.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Order => "s.sort_order",
            Self::Title => "s.title",
            Self::Price => "s.price",
            Self::CreatedAt => "s.created_at",
        }
    }

    /// Sort-field value of a row, as encoded into the next-page cursor.
    pub fn cursor_value(&self, service: &Service) -> Value {
        match self {
            Self::Order => json!(service.sort_order),
            Self::Title => json!(service.title),
            Self::Price => json!(service.price.to_f64().unwrap_or_default()),
            Self::CreatedAt => json!(service.created_at.to_rfc3339()),
        }
    }
}

/// Optional filters for service list queries; each is an independent AND
/// predicate.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    /// Case-insensitive substring match over title and description
    pub search: Option<String>,
    pub status: Option<ServiceStatus>,
    pub category_id: Option<i64>,
    /// Category slug, matched through a join
    pub category_slug: Option<String>,
    pub is_featured: Option<bool>,
    pub seller_id: Option<i64>,
}

/// Repository trait for Service data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Find a non-deleted service by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Service>, AppError>;

    /// Find a non-deleted service by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Service>, AppError>;

    /// List services matching the filter, cursor-paginated.
    ///
    /// Returns up to `page.fetch_limit()` rows ordered by the sort field with
    /// a `created_at DESC` tiebreaker.
    async fn list(
        &self,
        filter: &ServiceFilter,
        sort: ServiceSortField,
        page: &PageRequest,
    ) -> Result<Vec<Service>, AppError>;

    /// Check whether a slug is already taken by another non-deleted row.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    /// Insert a new service.
    async fn create(&self, service: &Service) -> Result<Service, AppError>;

    /// Update an existing service.
    async fn update(&self, service: &Service) -> Result<Service, AppError>;

    /// Soft-delete a service. Returns false when no live row matched.
    async fn soft_delete(&self, id: i64) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!(ServiceStatus::from_str("draft"), ServiceStatus::Draft);
        assert_eq!(ServiceStatus::from_str("ACTIVE"), ServiceStatus::Active);
        assert_eq!(ServiceStatus::from_str("inactive"), ServiceStatus::Inactive);
        assert_eq!(ServiceStatus::from_str("unknown"), ServiceStatus::Draft);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ServiceStatus::Draft,
            ServiceStatus::Active,
            ServiceStatus::Inactive,
        ] {
            assert_eq!(ServiceStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!(ServiceSortField::parse("order"), Some(ServiceSortField::Order));
        assert_eq!(ServiceSortField::parse("price"), Some(ServiceSortField::Price));
        assert_eq!(
            ServiceSortField::parse("createdAt"),
            Some(ServiceSortField::CreatedAt)
        );
        // Anything outside the allow-list is rejected, never interpolated.
        assert_eq!(ServiceSortField::parse("id; DROP TABLE services"), None);
        assert_eq!(ServiceSortField::parse("sellerId"), None);
        assert_eq!(ServiceSortField::parse(""), None);
    }

    #[test]
    fn test_sort_field_columns() {
        assert_eq!(ServiceSortField::Order.column(), "s.sort_order");
        assert_eq!(ServiceSortField::CreatedAt.column(), "s.created_at");
    }
}
