//! Route Configuration
//!
//! Configures all HTTP routes for the API. List and detail GETs are public;
//! mutations sit behind the JWT auth middleware with per-handler role checks.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    auth_middleware, create_security_headers_layer, rate_limit_api,
};
use crate::presentation::middleware::logging::track_metrics;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Request metrics for every route
        .layer(middleware::from_fn(track_metrics))
        // Security headers on all responses (outermost layer)
        .layer(create_security_headers_layer())
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/services", service_routes(state.clone()))
        .nest("/sellers", seller_routes(state.clone()))
        .nest("/payouts", payout_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/subscriptions", subscription_routes(state.clone()))
        // Apply API rate limiting to all API routes
        .route_layer(middleware::from_fn_with_state(state, rate_limit_api))
}

/// Service + category routes. Categories nest under /services/categories and
/// must be registered against the static segment before the `{id}` matcher.
fn service_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(handlers::service::list_services))
        .route("/categories", get(handlers::category::list_categories))
        .route(
            "/categories/slug/{slug}",
            get(handlers::category::get_category_by_slug),
        )
        .route("/categories/{id}", get(handlers::category::get_category))
        .route("/slug/{slug}", get(handlers::service::get_service_by_slug))
        .route("/{id}", get(handlers::service::get_service))
        .route("/{id}/reviews", get(handlers::review::list_service_reviews));

    let protected = Router::new()
        .route("/", post(handlers::service::create_service))
        .route("/categories", post(handlers::category::create_category))
        .route("/categories/{id}", patch(handlers::category::update_category))
        .route(
            "/categories/{id}",
            delete(handlers::category::delete_category),
        )
        .route("/{id}", patch(handlers::service::update_service))
        .route("/{id}", delete(handlers::service::delete_service))
        .route("/{id}/reviews", post(handlers::review::create_service_review))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Seller routes
fn seller_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(handlers::seller::list_sellers))
        .route("/{id}", get(handlers::seller::get_seller));

    let protected = Router::new()
        .route("/", post(handlers::seller::create_seller))
        .route("/{id}", patch(handlers::seller::update_seller))
        .route("/{id}/status", patch(handlers::seller::update_seller_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Payout routes
fn payout_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(handlers::payout::list_payouts))
        .route("/{id}", get(handlers::payout::get_payout));

    let protected = Router::new()
        .route("/", post(handlers::payout::create_payout))
        .route("/{id}/status", patch(handlers::payout::update_payout_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Review routes (service-scoped creation lives under /services)
fn review_routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/{id}", get(handlers::review::get_review));

    let protected = Router::new()
        .route("/{id}", delete(handlers::review::delete_review))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Subscription routes
fn subscription_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/{id}", get(handlers::subscription::get_subscription))
        .route(
            "/{id}/credits",
            get(handlers::subscription::list_credit_entries),
        );

    let protected = Router::new()
        .route("/", get(handlers::subscription::list_subscriptions))
        .route("/", post(handlers::subscription::create_subscription))
        .route("/{id}/cancel", post(handlers::subscription::cancel_subscription))
        .route("/{id}/credits", post(handlers::subscription::adjust_credits))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}
