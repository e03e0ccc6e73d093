//! Authentication types for the domain layer.
//!
//! An `AuthenticatedUser` is produced by whatever `SessionValidator` adapter
//! is wired in and then attached to the request by the auth middleware.
//! Nothing here knows about JWTs or PocketBase.

use super::UserId;
use thiserror::Error;

/// Email used for checkout when the token carried none.
pub const FALLBACK_CUSTOMER_EMAIL: &str = "no-email@provided.com";

/// Authenticated user resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Profile-store user record id.
    pub id: UserId,

    /// Email from the token claims, when present.
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self { id, email }
    }

    /// Email to hand to the payment provider.
    pub fn email_or_fallback(&self) -> &str {
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(FALLBACK_CUSTOMER_EMAIL)
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bearer token on the request.
    #[error("Missing token")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid token")]
    InvalidToken,

    /// The token's `exp` claim is in the past.
    #[error("Token expired")]
    TokenExpired,

    /// The token decoded but carries no user id.
    #[error("Invalid token - missing user id")]
    MissingUserId,

    /// The validator itself could not run.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken | AuthError::MissingUserId => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::ServiceUnavailable(_) => "AUTH_UNAVAILABLE",
        }
    }
}
