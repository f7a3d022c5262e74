//! # Domain Entities
//!
//! Core domain entities for the marketplace platform. All entities map
//! directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **Service**: A marketplace listing with a unique slug and soft-delete
//!   semantics
//! - **Category**: A catalog category; self-referential tree via `parent_id`
//! - **Seller**: A seller account, one-to-one with an external user identity
//! - **Payout**: A seller payout with commission split and linear lifecycle
//!
//! ## Supporting Entities
//!
//! - **Review**: Buyer reviews, one per (service, reviewer)
//! - **Subscription** / **CreditEntry**: Credit subscription with an
//!   append-only balance ledger
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer,
//! following the dependency inversion principle. Every list operation takes
//! the entity's allow-listed sort field plus the shared cursor `PageRequest`.

mod category;
mod payout;
mod review;
mod seller;
mod service;
mod subscription;

// Re-export Service entity and related types
pub use service::{Service, ServiceFilter, ServiceRepository, ServiceSortField, ServiceStatus};

// Re-export Category entity and related types
pub use category::{Category, CategoryFilter, CategoryRepository, CategorySortField};

// Re-export Seller entity and related types
pub use seller::{Seller, SellerFilter, SellerRepository, SellerSortField, SellerStatus};

// Re-export Payout entity and related types
pub use payout::{Payout, PayoutFilter, PayoutRepository, PayoutSortField, PayoutStatus};

// Re-export Review entity and related types
pub use review::{Review, ReviewFilter, ReviewRepository, ReviewSortField};

// Re-export Subscription entity and related types
pub use subscription::{
    CreditEntry, Subscription, SubscriptionFilter, SubscriptionPlan, SubscriptionRepository,
    SubscriptionSortField, SubscriptionStatus,
};

#[cfg(test)]
pub use category::MockCategoryRepository;
#[cfg(test)]
pub use payout::MockPayoutRepository;
#[cfg(test)]
pub use review::MockReviewRepository;
#[cfg(test)]
pub use seller::MockSellerRepository;
#[cfg(test)]
pub use service::MockServiceRepository;
#[cfg(test)]
pub use subscription::MockSubscriptionRepository;
