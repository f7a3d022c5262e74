//! Review entity and repository trait.
//!
//! Maps to the `reviews` table. One review per (service, reviewer) pair,
//! enforced by a unique index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Represents a buyer review of a service.
///
/// Maps to the `reviews` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - service_id: BIGINT NOT NULL REFERENCES services(id)
/// - reviewer_id: BIGINT NOT NULL -- external identity
/// - rating: INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5)
/// - comment: TEXT NULL
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - UNIQUE (service_id, reviewer_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Reviewed service
    pub service_id: i64,

    /// Reviewing user (external identity)
    pub reviewer_id: i64,

    /// Star rating, 1-5
    pub rating: i32,

    /// Optional free-text comment
    pub comment: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Allow-listed sortable columns for review list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSortField {
    #[default]
    CreatedAt,
    Rating,
}

impl ReviewSortField {
    /// Resolve a client-supplied sort name. Returns None for unknown fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    /// Column reference for ORDER BY and the cursor predicate.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Rating => "rating",
        }
    }

    /// Sort-field value of a row, as encoded into the next-page cursor.
    pub fn cursor_value(&self, review: &Review) -> Value {
        match self {
            Self::CreatedAt => json!(review.created_at.to_rfc3339()),
            Self::Rating => json!(review.rating),
        }
    }
}

/// Optional filters for review list queries.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub service_id: Option<i64>,
    /// Exact rating match
    pub rating: Option<i32>,
}

/// Repository trait for Review data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Find a review by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Review>, AppError>;

    /// List reviews matching the filter, cursor-paginated.
    async fn list(
        &self,
        filter: &ReviewFilter,
        sort: ReviewSortField,
        page: &PageRequest,
    ) -> Result<Vec<Review>, AppError>;

    /// Check whether a reviewer has already reviewed a service.
    async fn exists_for_reviewer(
        &self,
        service_id: i64,
        reviewer_id: i64,
    ) -> Result<bool, AppError>;

    /// Insert a new review.
    async fn create(&self, review: &Review) -> Result<Review, AppError>;

    /// Hard-delete a review. Returns false when no row matched.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!(ReviewSortField::parse("rating"), Some(ReviewSortField::Rating));
        assert_eq!(
            ReviewSortField::parse("created_at"),
            Some(ReviewSortField::CreatedAt)
        );
        assert_eq!(ReviewSortField::parse("comment"), None);
    }
}
