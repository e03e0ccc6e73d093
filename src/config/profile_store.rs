//! Profile store configuration (PocketBase)

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use super::payment::is_http_url;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileStoreConfig {
    /// PocketBase base URL, e.g. `https://pb.example.com`
    pub base_url: String,

    /// Admin token sent with plan lookups and user updates
    #[serde(default)]
    pub admin_token: Option<SecretString>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProfileStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            admin_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("profile_store.base_url"));
        }
        if !is_http_url(&self.base_url) {
            return Err(ValidationError::InvalidProfileStoreUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    30
}
