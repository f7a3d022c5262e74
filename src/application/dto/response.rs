//! Response DTOs
//!
//! The uniform `{status, message, data, meta}` envelope plus per-entity
//! response bodies. IDs serialize as strings (JavaScript-safe), timestamps
//! as RFC 3339, money as fixed-point decimal strings.

use serde::Serialize;

use crate::domain::{
    Category, CreditEntry, Payout, Review, Seller, Service, Subscription,
};
use crate::shared::pagination::CursorPage;

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful single-item response
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
            meta: None,
        }
    }

    /// Successful list response with pagination metadata
    pub fn paginated(message: impl Into<String>, data: T, meta: PageMeta) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
            meta: Some(meta),
        }
    }
}

/// Pagination metadata carried in the envelope's `meta` field
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    /// Extract navigation metadata from an assembled page.
    pub fn of<T>(page: &CursorPage<T>) -> Self {
        Self {
            count: page.items.len(),
            next_cursor: page.next_cursor.clone(),
            has_next_page: page.has_next_page,
            has_previous_page: page.has_previous_page,
        }
    }
}

/// Service response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub seller_id: String,
    pub category_id: Option<String>,
    pub status: String,
    pub order: i32,
    pub is_featured: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Service> for ServiceResponse {
    fn from(service: Service) -> Self {
        Self {
            id: service.id.to_string(),
            slug: service.slug,
            title: service.title,
            description: service.description,
            price: service.price.to_string(),
            seller_id: service.seller_id.to_string(),
            category_id: service.category_id.map(|id| id.to_string()),
            status: service.status.as_str().to_string(),
            order: service.sort_order,
            is_featured: service.is_featured,
            created_at: service.created_at.to_rfc3339(),
            updated_at: service.updated_at.to_rfc3339(),
        }
    }
}

/// Category response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub order: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_string(),
            slug: category.slug,
            name: category.name,
            description: category.description,
            parent_id: category.parent_id.map(|id| id.to_string()),
            order: category.sort_order,
            is_active: category.is_active,
            created_at: category.created_at.to_rfc3339(),
            updated_at: category.updated_at.to_rfc3339(),
        }
    }
}

/// Seller response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerResponse {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub status: String,
    pub commission_rate: String,
    pub total_sales: i64,
    pub total_revenue: String,
    pub average_rating: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Seller> for SellerResponse {
    fn from(seller: Seller) -> Self {
        Self {
            id: seller.id.to_string(),
            user_id: seller.user_id.to_string(),
            display_name: seller.display_name,
            status: seller.status.as_str().to_string(),
            commission_rate: seller.commission_rate.to_string(),
            total_sales: seller.total_sales,
            total_revenue: seller.total_revenue.to_string(),
            average_rating: seller.average_rating.to_string(),
            created_at: seller.created_at.to_rfc3339(),
            updated_at: seller.updated_at.to_rfc3339(),
        }
    }
}

/// Payout response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutResponse {
    pub id: String,
    pub seller_id: String,
    pub reference: String,
    pub period_start: String,
    pub period_end: String,
    pub amount: String,
    pub platform_fee: String,
    pub net_amount: String,
    pub item_count: i32,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Payout> for PayoutResponse {
    fn from(payout: Payout) -> Self {
        Self {
            id: payout.id.to_string(),
            seller_id: payout.seller_id.to_string(),
            reference: payout.reference.to_string(),
            period_start: payout.period_start.to_rfc3339(),
            period_end: payout.period_end.to_rfc3339(),
            amount: payout.amount.to_string(),
            platform_fee: payout.platform_fee.to_string(),
            net_amount: payout.net_amount.to_string(),
            item_count: payout.item_count,
            status: payout.status.as_str().to_string(),
            failure_reason: payout.failure_reason,
            created_at: payout.created_at.to_rfc3339(),
            updated_at: payout.updated_at.to_rfc3339(),
        }
    }
}

/// Review response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub service_id: String,
    pub reviewer_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id.to_string(),
            service_id: review.service_id.to_string(),
            reviewer_id: review.reviewer_id.to_string(),
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.to_rfc3339(),
            updated_at: review.updated_at.to_rfc3339(),
        }
    }
}

/// Subscription response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub user_id: String,
    pub plan: String,
    pub credits: i32,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id.to_string(),
            user_id: subscription.user_id.to_string(),
            plan: subscription.plan.as_str().to_string(),
            credits: subscription.credits,
            status: subscription.status.as_str().to_string(),
            created_at: subscription.created_at.to_rfc3339(),
            updated_at: subscription.updated_at.to_rfc3339(),
        }
    }
}

/// Credit ledger entry response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditEntryResponse {
    pub id: String,
    pub subscription_id: String,
    pub amount: i32,
    pub balance_after: i32,
    pub reason: String,
    pub created_at: String,
}

impl From<CreditEntry> for CreditEntryResponse {
    fn from(entry: CreditEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            subscription_id: entry.subscription_id.to_string(),
            amount: entry.amount,
            balance_after: entry.balance_after,
            reason: entry.reason,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::success("Service retrieved", serde_json::json!({"id": "1"}));
        let json: Value = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Service retrieved");
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn test_paginated_envelope_carries_meta() {
        let meta = PageMeta {
            count: 2,
            next_cursor: Some("abc".into()),
            has_next_page: true,
            has_previous_page: false,
        };
        let response = ApiResponse::paginated("Services listed", vec!["a", "b"], meta);
        let json: Value = serde_json::to_value(&response).unwrap();

        assert_eq!(json["meta"]["count"], 2);
        assert_eq!(json["meta"]["nextCursor"], "abc");
        assert_eq!(json["meta"]["hasNextPage"], true);
        assert_eq!(json["meta"]["hasPreviousPage"], false);
    }
}
