//! Service Endpoint Tests
//!
//! Parameter validation and error-envelope behavior that resolves before any
//! database round-trip.

use axum::http::StatusCode;

use crate::common::{body_json, mint_token, TestApp};

/// Non-numeric path IDs are rejected with 400
#[tokio::test]
async fn test_invalid_service_id_is_bad_request() {
    let app = TestApp::new();

    let response = app.get("/api/v1/services/not-a-number").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
}

/// Unknown status filter values are rejected with 400
#[tokio::test]
async fn test_unknown_status_filter_is_rejected() {
    let app = TestApp::new();

    let response = app.get("/api/v1/services?status=bogus").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Unknown status: bogus");
}

/// Sort fields outside the allow-list are rejected with 400, never passed
/// into the query
#[tokio::test]
async fn test_unknown_sort_field_is_rejected() {
    let app = TestApp::new();

    let response = app.get("/api/v1/services?sortBy=sellerId").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Unknown sort field: sellerId");
}

/// The same allow-listing applies to the category listing
#[tokio::test]
async fn test_category_sort_field_allow_list() {
    let app = TestApp::new();

    let response = app
        .get("/api/v1/services/categories?sortBy=parentId")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Body validation failures return 400 before touching storage
#[tokio::test]
async fn test_create_service_with_invalid_body() {
    let app = TestApp::new();
    let token = mint_token(1, "editor");

    // Empty title fails the length validator.
    let body = r#"{
        "slug": "logo-design",
        "title": "",
        "description": "Custom logo design package",
        "price": 150.0,
        "sellerId": "10"
    }"#;

    let response = app.post_json_auth("/api/v1/services", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
}

/// Negative prices fail the range validator
#[tokio::test]
async fn test_create_service_with_negative_price() {
    let app = TestApp::new();
    let token = mint_token(1, "editor");

    let body = r#"{
        "slug": "logo-design",
        "title": "Logo design",
        "description": "Custom logo design package",
        "price": -1.0,
        "sellerId": "10"
    }"#;

    let response = app.post_json_auth("/api/v1/services", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Malformed seller IDs in the body are rejected with 400
#[tokio::test]
async fn test_create_service_with_bad_seller_id() {
    let app = TestApp::new();
    let token = mint_token(1, "admin");

    let body = r#"{
        "slug": "logo-design",
        "title": "Logo design",
        "description": "Custom logo design package",
        "price": 150.0,
        "sellerId": "abc"
    }"#;

    let response = app.post_json_auth("/api/v1/services", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid seller ID");
}

/// Unknown payout status names are rejected with 400
#[tokio::test]
async fn test_unknown_payout_status_filter() {
    let app = TestApp::new();

    let response = app.get("/api/v1/payouts?status=reversed").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Unknown status: reversed");
}
