//! ProfileStore port - writes subscription state onto user records.
//!
//! The profile store (PocketBase) owns the `users` and `plans` collections.
//! This service never reads a user back before writing: every write is a
//! blind, absolute assignment keyed by user id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::billing::ProfilePatch;
use crate::domain::foundation::UserId;

/// Port for the external user/plan store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up a plan record by its exact name.
    ///
    /// Returns `Ok(None)` when no record matches.
    async fn get_plan_by_name(&self, name: &str) -> Result<Option<PlanRecord>, ProfileStoreError>;

    /// Apply a patch to a user record.
    async fn patch_user(
        &self,
        user_id: &UserId,
        patch: &ProfilePatch,
    ) -> Result<(), ProfileStoreError>;
}

/// Plan record as stored in the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: String,
    pub name: String,
}

/// Errors from the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileStoreError {
    #[error("Profile store unreachable: {0}")]
    Network(String),

    #[error("Profile store rejected request ({status}): {body}")]
    Client { status: u16, body: String },

    #[error("Profile store failed ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Profile store response could not be decoded: {0}")]
    Decode(String),
}

impl ProfileStoreError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status >= 500 {
            ProfileStoreError::Server { status, body }
        } else {
            ProfileStoreError::Client { status, body }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProfileStoreError::Network(_) | ProfileStoreError::Server { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ProfileStore) {}
    }

    #[test]
    fn from_status_splits_client_and_server() {
        assert!(matches!(
            ProfileStoreError::from_status(404, "missing"),
            ProfileStoreError::Client { status: 404, .. }
        ));
        assert!(matches!(
            ProfileStoreError::from_status(503, "down"),
            ProfileStoreError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(ProfileStoreError::Network("reset".into()).is_retryable());
        assert!(ProfileStoreError::from_status(500, "").is_retryable());
        assert!(!ProfileStoreError::from_status(400, "").is_retryable());
        assert!(!ProfileStoreError::Decode("bad json".into()).is_retryable());
    }
}
