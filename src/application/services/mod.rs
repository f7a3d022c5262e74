//! Application Services
//!
//! Business logic services orchestrating domain entities and repositories.
//! Each service owns its error enum; handlers map those onto HTTP errors.

mod catalog_service;
mod category_service;
mod payout_service;
mod review_service;
mod seller_service;
mod subscription_service;

pub use catalog_service::{
    CatalogError, CatalogService, CatalogServiceImpl, CreateServiceDto, ServiceListParams,
    UpdateServiceDto,
};
pub use category_service::{
    CategoryError, CategoryListParams, CategoryService, CategoryServiceImpl, CreateCategoryDto,
    UpdateCategoryDto,
};
pub use payout_service::{
    platform_fee, CreatePayoutDto, PayoutError, PayoutListParams, PayoutService, PayoutServiceImpl,
};
pub use review_service::{
    CreateReviewDto, ReviewError, ReviewListParams, ReviewService, ReviewServiceImpl,
};
pub use seller_service::{
    CreateSellerDto, SellerError, SellerListParams, SellerService, SellerServiceImpl,
    UpdateSellerDto,
};
pub use subscription_service::{
    CreateSubscriptionDto, CreditAdjustmentDto, SubscriptionError, SubscriptionListParams,
    SubscriptionService, SubscriptionServiceImpl,
};
