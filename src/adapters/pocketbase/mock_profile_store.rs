//! In-memory profile store for testing.
//!
//! Records every patch so tests can assert on exactly what would have been
//! written to the user record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::billing::ProfilePatch;
use crate::domain::foundation::UserId;
use crate::ports::{PlanRecord, ProfileStore, ProfileStoreError};

/// Mock profile store with call tracking and error injection.
#[derive(Default, Clone)]
pub struct MockProfileStore {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Plan records by name.
    plans: HashMap<String, PlanRecord>,

    /// Patches in the order they were applied.
    patches: Vec<(UserId, ProfilePatch)>,

    /// Number of plan lookups.
    plan_lookups: usize,

    /// Error returned by every `patch_user` call.
    patch_error: Option<ProfileStoreError>,

    /// Error returned by every `get_plan_by_name` call.
    lookup_error: Option<ProfileStoreError>,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plan record to the "database".
    pub fn with_plan(self, id: &str, name: &str) -> Self {
        self.state().plans.insert(
            name.to_string(),
            PlanRecord {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    /// Make every patch fail.
    pub fn failing_patches(self, error: ProfileStoreError) -> Self {
        self.state().patch_error = Some(error);
        self
    }

    /// Make every plan lookup fail.
    pub fn failing_lookups(self, error: ProfileStoreError) -> Self {
        self.state().lookup_error = Some(error);
        self
    }

    /// Patches applied so far.
    pub fn patches(&self) -> Vec<(UserId, ProfilePatch)> {
        self.state().patches.clone()
    }

    /// Most recent patch for a user.
    pub fn last_patch_for(&self, user_id: &str) -> Option<ProfilePatch> {
        self.state()
            .patches
            .iter()
            .rev()
            .find(|(id, _)| id.as_str() == user_id)
            .map(|(_, patch)| patch.clone())
    }

    pub fn plan_lookups(&self) -> usize {
        self.state().plan_lookups
    }

    /// Total calls of either kind.
    pub fn call_count(&self) -> usize {
        let state = self.state();
        state.patches.len() + state.plan_lookups
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn get_plan_by_name(&self, name: &str) -> Result<Option<PlanRecord>, ProfileStoreError> {
        let mut state = self.state();
        state.plan_lookups += 1;
        if let Some(err) = &state.lookup_error {
            return Err(err.clone());
        }
        Ok(state.plans.get(name).cloned())
    }

    async fn patch_user(
        &self,
        user_id: &UserId,
        patch: &ProfilePatch,
    ) -> Result<(), ProfileStoreError> {
        let mut state = self.state();
        if let Some(err) = &state.patch_error {
            return Err(err.clone());
        }
        state.patches.push((user_id.clone(), patch.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionSyncResult;
    use crate::domain::foundation::{PlanId, Timestamp};

    fn patch() -> ProfilePatch {
        SubscriptionSyncResult::downgraded(
            UserId::new("u1").unwrap(),
            PlanId::new("pb_free").unwrap(),
            Timestamp::from_unix_secs(0).unwrap(),
        )
        .to_patch()
    }

    #[tokio::test]
    async fn records_patches_in_order() {
        let store = MockProfileStore::new();
        let user = UserId::new("u1").unwrap();

        store.patch_user(&user, &patch()).await.unwrap();
        store.patch_user(&user, &patch()).await.unwrap();

        assert_eq!(store.patches().len(), 2);
        assert_eq!(store.last_patch_for("u1"), Some(patch()));
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_store_records_nothing() {
        let store =
            MockProfileStore::new().failing_patches(ProfileStoreError::Network("down".into()));

        let result = store.patch_user(&UserId::new("u1").unwrap(), &patch()).await;

        assert!(result.is_err());
        assert!(store.patches().is_empty());
    }

    #[tokio::test]
    async fn plan_lookup_by_exact_name() {
        let store = MockProfileStore::new().with_plan("pb_company", "Company");

        assert_eq!(
            store.get_plan_by_name("Company").await.unwrap().map(|p| p.id),
            Some("pb_company".to_string())
        );
        assert!(store.get_plan_by_name("company").await.unwrap().is_none());
        assert_eq!(store.plan_lookups(), 2);
    }
}
