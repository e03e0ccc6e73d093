//! Service configuration, read once at startup.
//!
//! Everything comes from `HYDRO_BILLING__`-prefixed environment variables
//! (a `.env` file is honoured in development). Double underscores nest, so
//! `HYDRO_BILLING__BILLING__PLAN_IDS__FREE=abc` lands in
//! `billing.plan_ids.free`.
//!
//! ```no_run
//! use hydro_billing::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod billing;
mod error;
mod payment;
mod profile_store;
mod server;

pub use auth::AuthConfig;
pub use billing::BillingConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use profile_store::ProfileStoreConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "HYDRO_BILLING";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub payment: PaymentConfig,
    pub profile_store: ProfileStoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

impl AppConfig {
    /// Fails when a required key is absent or a value has the wrong type.
    /// Semantic checks live in [`AppConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let source = config::Environment::with_prefix(ENV_PREFIX).separator("__");
        let loaded = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(loaded)
    }

    /// Stops at the first section that fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.payment.validate()?;
        self.profile_store.validate()?;
        self.billing.validate()?;
        self.auth.warn_if_unverified(&self.server.environment);
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
