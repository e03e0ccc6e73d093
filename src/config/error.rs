//! Startup configuration errors

use thiserror::Error;

/// Reading the environment into [`AppConfig`](super::AppConfig) failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// A loaded value that fails a semantic check.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingRequired(&'static str),

    #[error("server.port must be non-zero")]
    InvalidPort,

    #[error("timeout must be between 1 and 300 seconds")]
    InvalidTimeout,

    #[error("server.host '{0}' is not an IP address")]
    InvalidHost(String),

    #[error("payment.stripe_api_key must start with sk_")]
    InvalidStripeKey,

    #[error("payment.stripe_webhook_secret must start with whsec_")]
    InvalidStripeWebhookSecret,

    #[error("payment.api_base_url must be an http(s) URL")]
    InvalidStripeBaseUrl,

    #[error("profile_store.base_url must be an http(s) URL")]
    InvalidProfileStoreUrl,

    #[error("billing.plan_ids.{0} is required")]
    MissingPlanId(String),
}
