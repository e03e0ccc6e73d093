//! Bearer token port.
//!
//! The auth middleware hands it the raw token from `Authorization: Bearer`
//! and gets back the user the billing endpoints act for.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Resolves a bearer token to a user.
///
/// Error mapping expected from implementations:
///
/// | Situation | Error |
/// |-----------|-------|
/// | undecodable or badly signed | `InvalidToken` |
/// | past `exp` | `TokenExpired` |
/// | no `id` claim | `MissingUserId` |
/// | verifier backend down | `ServiceUnavailable` |
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// `token` has the `Bearer ` prefix already stripped.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
