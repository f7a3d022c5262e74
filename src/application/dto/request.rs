//! Request DTOs
//!
//! Data structures for API request bodies and list query parameters.
//! JSON field names are camelCase; ID fields travel as strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::shared::pagination::SortOrder;

// =============================================================================
// Services
// =============================================================================

/// Create service request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 80, message = "Slug must be 1-80 characters"))]
    pub slug: String,

    #[validate(length(min = 1, max = 160, message = "Title must be 1-160 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    pub seller_id: String,
    pub category_id: Option<String>,
    pub status: Option<String>,

    #[serde(rename = "order")]
    pub sort_order: Option<i32>,

    pub is_featured: Option<bool>,
}

/// Update service request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 80, message = "Slug must be 1-80 characters"))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 160, message = "Title must be 1-160 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    /// Absent = untouched, null = clear the category
    pub category_id: Option<Option<String>>,
    pub status: Option<String>,

    #[serde(rename = "order")]
    pub sort_order: Option<i32>,

    pub is_featured: Option<bool>,
}

/// Service list query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<i64>,
    pub category_slug: Option<String>,
    /// Boolean coerced from its query-string form ("true"/"1")
    pub is_featured: Option<String>,
    pub seller_id: Option<i64>,
}

// =============================================================================
// Categories
// =============================================================================

/// Create category request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 80, message = "Slug must be 1-80 characters"))]
    pub slug: String,

    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub parent_id: Option<String>,

    #[serde(rename = "order")]
    pub sort_order: Option<i32>,

    pub is_active: Option<bool>,
}

/// Update category request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 80, message = "Slug must be 1-80 characters"))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    /// Absent = untouched, null = clear the description
    pub description: Option<Option<String>>,

    /// Absent = untouched, null = detach from parent
    pub parent_id: Option<Option<String>>,

    #[serde(rename = "order")]
    pub sort_order: Option<i32>,

    pub is_active: Option<bool>,
}

/// Category list query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    /// Boolean coerced from its query-string form ("true"/"1")
    pub is_active: Option<String>,
    pub parent_id: Option<i64>,
}

// =============================================================================
// Sellers
// =============================================================================

/// Create seller request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSellerRequest {
    pub user_id: String,

    #[validate(length(min = 1, max = 120, message = "Display name must be 1-120 characters"))]
    pub display_name: String,

    #[validate(range(min = 0.0, max = 100.0, message = "Commission rate must be 0-100"))]
    pub commission_rate: f64,
}

/// Update seller request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSellerRequest {
    #[validate(length(min = 1, max = 120, message = "Display name must be 1-120 characters"))]
    pub display_name: Option<String>,

    #[validate(range(min = 0.0, max = 100.0, message = "Commission rate must be 0-100"))]
    pub commission_rate: Option<f64>,
}

/// Seller status transition request
#[derive(Debug, Deserialize)]
pub struct UpdateSellerStatusRequest {
    pub status: String,
}

/// Seller list query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SellerListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub status: Option<String>,
}

// =============================================================================
// Payouts
// =============================================================================

/// Create payout request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayoutRequest {
    pub seller_id: String,

    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,

    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: f64,

    #[validate(range(min = 0, message = "Item count cannot be negative"))]
    pub item_count: i32,
}

/// Payout status transition request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayoutStatusRequest {
    pub status: String,

    #[validate(length(min = 1, max = 500, message = "Failure reason must be 1-500 characters"))]
    pub failure_reason: Option<String>,
}

/// Payout list query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PayoutListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub seller_id: Option<i64>,
    pub status: Option<String>,
}

// =============================================================================
// Reviews
// =============================================================================

/// Create review request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Review list query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub rating: Option<i32>,
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Create subscription request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub user_id: String,
    pub plan: String,
}

/// Credit adjustment request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditAdjustmentRequest {
    /// Signed delta; positive grants, negative spends
    pub amount: i32,

    #[validate(length(min = 1, max = 200, message = "Reason must be 1-200 characters"))]
    pub reason: String,
}

/// Subscription list query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub status: Option<String>,
    pub plan: Option<String>,
}

/// Credit ledger list query parameters
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreditEntryListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}
