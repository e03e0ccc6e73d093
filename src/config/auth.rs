//! Authentication configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::server::Environment;

/// Bearer token settings for profile-store issued JWTs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret; when absent, token signatures are not checked.
    #[serde(default)]
    pub token_secret: Option<SecretString>,
}

impl AuthConfig {
    pub fn verifies_signatures(&self) -> bool {
        self.token_secret.is_some()
    }

    /// Never fails; an unverified setup in production is only logged.
    pub fn warn_if_unverified(&self, environment: &Environment) {
        if *environment == Environment::Production && !self.verifies_signatures() {
            tracing::warn!(
                "auth.token_secret is not set in production; bearer tokens are decoded without signature checks"
            );
        }
    }
}
