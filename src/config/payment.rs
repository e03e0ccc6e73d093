//! Stripe credentials and client settings

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// `sk_test_` or `sk_live_` secret key.
    pub stripe_api_key: SecretString,
    /// `whsec_` signing secret of the webhook endpoint.
    pub stripe_webhook_secret: SecretString,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Refuse webhook deliveries with `livemode: false`.
    #[serde(default)]
    pub require_livemode: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl PaymentConfig {
    pub fn new(stripe_api_key: &str, stripe_webhook_secret: &str) -> Self {
        Self {
            stripe_api_key: SecretString::new(stripe_api_key.to_owned()),
            stripe_webhook_secret: SecretString::new(stripe_webhook_secret.to_owned()),
            api_base_url: default_api_base_url(),
            require_livemode: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_live_")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_secret(
            &self.stripe_api_key,
            "payment.stripe_api_key",
            "sk_",
            ValidationError::InvalidStripeKey,
        )?;
        check_secret(
            &self.stripe_webhook_secret,
            "payment.stripe_webhook_secret",
            "whsec_",
            ValidationError::InvalidStripeWebhookSecret,
        )?;

        if !is_http_url(&self.api_base_url) {
            return Err(ValidationError::InvalidStripeBaseUrl);
        }
        Ok(())
    }
}

fn check_secret(
    secret: &SecretString,
    key: &'static str,
    prefix: &str,
    wrong_prefix: ValidationError,
) -> Result<(), ValidationError> {
    let value = secret.expose_secret();
    if value.is_empty() {
        Err(ValidationError::MissingRequired(key))
    } else if !value.starts_with(prefix) {
        Err(wrong_prefix)
    } else {
        Ok(())
    }
}

/// Absolute `http`/`https` URL with a host.
pub(super) fn is_http_url(value: &str) -> bool {
    reqwest::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
