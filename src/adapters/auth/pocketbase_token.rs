//! Profile-store token adapter for bearer authentication.
//!
//! Implements the `SessionValidator` port for tokens issued by the profile
//! store (PocketBase). Tokens are decoded locally:
//!
//! 1. Without a configured secret the signature is NOT checked; only the
//!    payload is read. This matches the historical behavior of the frontend
//!    integration and must be paired with network-level trust.
//! 2. With a secret, HS256 signatures are verified as well.
//!
//! In both modes `exp` is enforced when present (no leeway), the `id` claim is
//! required and `email` is optional.

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Claims read from a profile-store auth token.
#[derive(Debug, Deserialize)]
struct ProfileTokenClaims {
    /// User record id.
    #[serde(default)]
    id: Option<String>,

    #[serde(default)]
    email: Option<String>,
}

/// Validates profile-store issued JWTs.
pub struct PocketBaseTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl PocketBaseTokenValidator {
    /// Validator that reads claims without checking the signature.
    pub fn unverified() -> Self {
        let mut validation = base_validation();
        validation.insecure_disable_signature_validation();

        tracing::warn!("Bearer token signatures are not verified; set auth.token_secret to enable");

        Self {
            decoding_key: DecodingKey::from_secret(&[]),
            validation,
        }
    }

    /// Validator that verifies HS256 signatures with `secret`.
    pub fn with_secret(secret: &SecretString) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: base_validation(),
        }
    }

    /// Picks the verifying mode when a secret is configured.
    pub fn from_optional_secret(secret: Option<&SecretString>) -> Self {
        match secret {
            Some(secret) => Self::with_secret(secret),
            None => Self::unverified(),
        }
    }

    fn decode_claims(&self, token: &str) -> Result<ProfileTokenClaims, AuthError> {
        decode::<ProfileTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidSignature => {
                    tracing::warn!("Token signature mismatch");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::debug!(error = %e, "Token could not be decoded");
                    AuthError::InvalidToken
                }
            })
    }
}

fn base_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_aud = false;
    // `exp` is checked when present but not required.
    validation.required_spec_claims.clear();
    validation
}

/// Whether `validation` checks signatures (the flag itself is crate-private
/// in `jsonwebtoken`, so compare against a copy with checking disabled).
fn verifies_signature(validation: &Validation) -> bool {
    let mut disabled = validation.clone();
    disabled.insecure_disable_signature_validation();
    *validation != disabled
}

#[async_trait]
impl SessionValidator for PocketBaseTokenValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.decode_claims(token)?;

        let user_id = claims
            .id
            .filter(|id| !id.trim().is_empty())
            .and_then(|id| UserId::new(id).ok())
            .ok_or_else(|| {
                tracing::warn!("Token carries no user id");
                AuthError::MissingUserId
            })?;

        Ok(AuthenticatedUser::new(
            user_id,
            claims.email.filter(|e| !e.is_empty()),
        ))
    }
}

impl std::fmt::Debug for PocketBaseTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketBaseTokenValidator")
            .field("verifies_signature", &verifies_signature(&self.validation))
            .finish_non_exhaustive()
    }
}
