//! Authentication Middleware
//!
//! JWT validation for mutation routes. Tokens are issued by the external
//! identity provider; this middleware verifies the signature and exposes the
//! user id and role to handlers.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;
use crate::startup::AppState;

/// Platform roles carried in the JWT `role` claim.
///
/// Ordered by privilege: Editor < Admin < SuperAdmin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UserRole {
    Editor,
    Admin,
    SuperAdmin,
}

impl UserRole {
    /// Parse a role claim. Returns None for unknown roles.
    pub fn from_claim(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "editor" => Some(Self::Editor),
            "admin" => Some(Self::Admin),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Platform role name
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: UserRole,
}

impl AuthUser {
    /// Require at least the given role.
    pub fn require(&self, minimum: UserRole) -> Result<(), AppError> {
        if self.role >= minimum {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Requires {} role",
                minimum.as_str()
            )))
        }
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    // Check for Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    // Decode and validate JWT
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.settings.jwt.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".into())
        }
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    // Parse user ID and role from claims
    let user_id: i64 = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token claims".into()))?;

    let role = UserRole::from_claim(&token_data.claims.role)
        .ok_or_else(|| AppError::Unauthorized("Unknown role".into()))?;

    // Insert authenticated user into request extensions
    request.extensions_mut().insert(AuthUser { user_id, role });

    // Continue to the next handler
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::SuperAdmin > UserRole::Admin);
        assert!(UserRole::Admin > UserRole::Editor);
    }

    #[test]
    fn test_role_claim_parsing() {
        assert_eq!(UserRole::from_claim("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_claim("super_admin"), Some(UserRole::SuperAdmin));
        assert_eq!(UserRole::from_claim("viewer"), None);
    }

    #[test]
    fn test_require_role() {
        let admin = AuthUser {
            user_id: 1,
            role: UserRole::Admin,
        };
        assert!(admin.require(UserRole::Editor).is_ok());
        assert!(admin.require(UserRole::Admin).is_ok());
        assert!(admin.require(UserRole::SuperAdmin).is_err());
    }
}
