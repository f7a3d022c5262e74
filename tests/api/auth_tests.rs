//! Authentication & Authorization Tests
//!
//! Mutation endpoints require a valid JWT; role checks run per handler.

use axum::http::StatusCode;

use crate::common::{body_json, mint_expired_token, mint_token, TestApp};

const CREATE_SERVICE_BODY: &str = r#"{
    "slug": "logo-design",
    "title": "Logo design",
    "description": "Custom logo design package",
    "price": 150.0,
    "sellerId": "10"
}"#;

/// Mutations without a token are rejected with 401
#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app.post_json("/api/v1/services", CREATE_SERVICE_BODY).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
}

/// A garbage bearer token is rejected with 401
#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .post_json_auth("/api/v1/services", CREATE_SERVICE_BODY, "not-a-jwt")
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// An expired token is rejected with 401
#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = TestApp::new();
    let token = mint_expired_token(1, "admin");

    let response = app
        .post_json_auth("/api/v1/services", CREATE_SERVICE_BODY, &token)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Token expired");
}

/// A token carrying an unknown role is rejected with 401
#[tokio::test]
async fn test_unknown_role_is_unauthorized() {
    let app = TestApp::new();
    let token = mint_token(1, "viewer");

    let response = app
        .post_json_auth("/api/v1/services", CREATE_SERVICE_BODY, &token)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Deleting a service requires ADMIN; an editor gets 403
#[tokio::test]
async fn test_editor_cannot_delete_service() {
    let app = TestApp::new();
    let token = mint_token(1, "editor");

    let response = app.delete_auth("/api/v1/services/123", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
}

/// Onboarding a seller requires ADMIN; an editor gets 403
#[tokio::test]
async fn test_editor_cannot_create_seller() {
    let app = TestApp::new();
    let token = mint_token(1, "editor");

    let body = r#"{"userId": "42", "displayName": "Studio North", "commissionRate": 20.0}"#;
    let response = app.post_json_auth("/api/v1/sellers", body, &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
