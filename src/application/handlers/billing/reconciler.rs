//! SubscriptionReconciler - turns provider events into user-record patches.
//!
//! Every write is a blind, absolute assignment. Timestamps come from the
//! triggering event, so replaying an event produces the same patch.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::billing::{
    cents_to_major, BillingError, BillingPeriod, CheckoutSessionObject, InvoiceObject, PlanCatalog,
    ProviderEvent, SubscriptionObject, SubscriptionSyncResult, VerifiedEvent,
};
use crate::domain::foundation::{PlanId, Timestamp, UserId};
use crate::ports::{ProfileStore, ProfileStoreError};

/// Why an event could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("No user id on {object} {id}")]
    MissingUserId { object: &'static str, id: String },

    #[error("Plan '{0}' has no external identifier")]
    UnmappedPlan(String),

    #[error("Subscription {0} has no current period end")]
    MissingPeriodEnd(String),

    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error(transparent)]
    ProfileStore(#[from] ProfileStoreError),
}

impl From<ReconcileError> for BillingError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::ProfileStore(e) => BillingError::profile_store(e.to_string()),
            ReconcileError::UnmappedPlan(name) => BillingError::unmapped_plan(name),
            other => BillingError::internal(other.to_string()),
        }
    }
}

/// Applies provider state to user records.
///
/// `Ok(None)` means the event was observed but nothing was written.
pub struct SubscriptionReconciler {
    catalog: Arc<PlanCatalog>,
    profile_store: Arc<dyn ProfileStore>,
}

impl SubscriptionReconciler {
    pub fn new(catalog: Arc<PlanCatalog>, profile_store: Arc<dyn ProfileStore>) -> Self {
        Self {
            catalog,
            profile_store,
        }
    }

    /// Routes a verified event to the matching reconciliation.
    pub async fn dispatch(
        &self,
        event: &VerifiedEvent,
    ) -> Result<Option<SubscriptionSyncResult>, ReconcileError> {
        let occurred_at = Timestamp::from_unix_secs(event.created)
            .ok_or(ReconcileError::InvalidTimestamp(event.created))?;

        match &event.payload {
            ProviderEvent::CheckoutCompleted(session) => self
                .on_checkout_completed(session, occurred_at)
                .await
                .map(Some),
            ProviderEvent::SubscriptionCreated(sub) => {
                self.on_subscription_created(sub, occurred_at).await
            }
            ProviderEvent::SubscriptionUpdated(sub) => {
                self.on_subscription_updated(sub, occurred_at).await
            }
            ProviderEvent::SubscriptionDeleted(sub) => {
                self.on_subscription_deleted(sub, occurred_at).await
            }
            ProviderEvent::PaymentSucceeded(invoice) => {
                self.on_payment_succeeded(invoice);
                Ok(None)
            }
            ProviderEvent::PaymentFailed(invoice) => {
                self.on_payment_failed(invoice);
                Ok(None)
            }
            ProviderEvent::Unrecognized { event_type } => {
                tracing::debug!(event_type = %event_type, "No reconciliation for event type");
                Ok(None)
            }
        }
    }

    /// Upgrades the user who completed checkout.
    ///
    /// The period end is computed from `paid_at` and the session's billing period.
    pub async fn on_checkout_completed(
        &self,
        session: &CheckoutSessionObject,
        paid_at: Timestamp,
    ) -> Result<SubscriptionSyncResult, ReconcileError> {
        let user_id = session
            .user_id()
            .and_then(|id| UserId::new(id).ok())
            .ok_or_else(|| ReconcileError::MissingUserId {
                object: "checkout session",
                id: session.id.clone(),
            })?;

        let plan_id = self
            .resolve_plan(
                session.metadata_value("plan_id"),
                session.metadata_value("plan_name"),
            )
            .await?;

        let period = session
            .metadata_value("billing_period")
            .and_then(BillingPeriod::from_tag)
            .unwrap_or(BillingPeriod::Monthly);

        tracing::info!(
            user_id = %user_id,
            plan_id = %plan_id,
            session_id = %session.id,
            billing_period = period.tag(),
            "Checkout completed"
        );

        let result = SubscriptionSyncResult::activated(
            user_id,
            plan_id,
            period,
            session.customer.clone(),
            session.subscription.clone(),
            paid_at,
        );
        self.write(&result).await?;
        Ok(result)
    }

    /// Checkout completion performs the upgrade; a created subscription with
    /// no user metadata is only logged.
    pub async fn on_subscription_created(
        &self,
        subscription: &SubscriptionObject,
        occurred_at: Timestamp,
    ) -> Result<Option<SubscriptionSyncResult>, ReconcileError> {
        if subscription.user_id().is_none() {
            tracing::info!(
                subscription_id = %subscription.id,
                status = %subscription.status,
                "Subscription created"
            );
            return Ok(None);
        }
        self.on_subscription_updated(subscription, occurred_at).await
    }

    /// Mirrors an active subscription onto the user record, or downgrades an
    /// inactive one.
    pub async fn on_subscription_updated(
        &self,
        subscription: &SubscriptionObject,
        occurred_at: Timestamp,
    ) -> Result<Option<SubscriptionSyncResult>, ReconcileError> {
        let Some(user_id) = subscription_user(subscription) else {
            tracing::info!(
                subscription_id = %subscription.id,
                status = %subscription.status,
                "Subscription updated without user metadata; skipping"
            );
            return Ok(None);
        };

        if !subscription.is_active() {
            return self
                .on_subscription_inactive(user_id, subscription, occurred_at)
                .await
                .map(Some);
        }

        let plan_id = self
            .resolve_plan(
                subscription.metadata_value("plan_id"),
                subscription.metadata_value("plan_name"),
            )
            .await?;

        let period_end = subscription
            .current_period_end
            .ok_or_else(|| ReconcileError::MissingPeriodEnd(subscription.id.clone()))
            .and_then(|secs| {
                Timestamp::from_unix_secs(secs).ok_or(ReconcileError::InvalidTimestamp(secs))
            })?;

        let result = SubscriptionSyncResult::mirrored(
            user_id,
            plan_id,
            &subscription.status,
            period_end,
            subscription.customer.clone(),
            subscription.id.clone(),
        );
        self.write(&result).await?;
        Ok(Some(result))
    }

    /// A subscription that is no longer `active` drops the user to free.
    pub async fn on_subscription_inactive(
        &self,
        user_id: UserId,
        subscription: &SubscriptionObject,
        effective_at: Timestamp,
    ) -> Result<SubscriptionSyncResult, ReconcileError> {
        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Subscription inactive; downgrading"
        );
        self.downgrade(user_id, effective_at).await
    }

    /// Downgrades the subscription's user, whatever plan they were on.
    pub async fn on_subscription_deleted(
        &self,
        subscription: &SubscriptionObject,
        effective_at: Timestamp,
    ) -> Result<Option<SubscriptionSyncResult>, ReconcileError> {
        let Some(user_id) = subscription_user(subscription) else {
            tracing::warn!(
                subscription_id = %subscription.id,
                "Deleted subscription has no user metadata; nothing to downgrade"
            );
            return Ok(None);
        };

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            "Subscription deleted"
        );
        self.downgrade(user_id, effective_at).await.map(Some)
    }

    pub fn on_payment_succeeded(&self, invoice: &InvoiceObject) {
        tracing::info!(
            invoice_id = %invoice.id,
            subscription_id = ?invoice.subscription,
            amount = cents_to_major(invoice.amount_paid),
            currency = ?invoice.currency,
            "Payment succeeded"
        );
    }

    pub fn on_payment_failed(&self, invoice: &InvoiceObject) {
        tracing::warn!(
            invoice_id = %invoice.id,
            customer = ?invoice.customer,
            subscription_id = ?invoice.subscription,
            amount_due = cents_to_major(invoice.amount_due),
            "Payment failed"
        );
    }

    /// Writes the free plan with status `cancelled`.
    pub async fn downgrade(
        &self,
        user_id: UserId,
        effective_at: Timestamp,
    ) -> Result<SubscriptionSyncResult, ReconcileError> {
        let result = SubscriptionSyncResult::downgraded(
            user_id,
            self.catalog.free_plan().id.clone(),
            effective_at,
        );
        self.write(&result).await?;
        Ok(result)
    }

    /// Resolves the external plan id: explicit id, then catalog name, then
    /// the profile store's own plan records.
    async fn resolve_plan(
        &self,
        plan_id: Option<&str>,
        plan_name: Option<&str>,
    ) -> Result<PlanId, ReconcileError> {
        if let Some(id) = plan_id.and_then(|id| PlanId::new(id).ok()) {
            return Ok(id);
        }

        let Some(name) = plan_name.filter(|n| !n.trim().is_empty()) else {
            return Err(ReconcileError::UnmappedPlan("Unknown".to_string()));
        };

        if let Some(id) = self.catalog.external_id_for(name) {
            return Ok(id.clone());
        }

        match self.profile_store.get_plan_by_name(name).await? {
            Some(record) => {
                PlanId::new(record.id).map_err(|_| ReconcileError::UnmappedPlan(name.to_string()))
            }
            None => Err(ReconcileError::UnmappedPlan(name.to_string())),
        }
    }

    async fn write(&self, result: &SubscriptionSyncResult) -> Result<(), ReconcileError> {
        let patch = result.to_patch();
        self.profile_store
            .patch_user(&result.user_id, &patch)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %result.user_id,
                    plan_id = %result.plan_id,
                    error = %e,
                    "Failed to write subscription state"
                );
                ReconcileError::from(e)
            })
    }
}

fn subscription_user(subscription: &SubscriptionObject) -> Option<UserId> {
    subscription.user_id().and_then(|id| UserId::new(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::adapters::pocketbase::MockProfileStore;
    use crate::domain::billing::catalog::test_catalog;
    use crate::domain::billing::SyncStatus;

    const PAID_AT: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z

    fn reconciler(store: &MockProfileStore) -> SubscriptionReconciler {
        SubscriptionReconciler::new(Arc::new(test_catalog()), Arc::new(store.clone()))
    }

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn session(meta: &[(&str, &str)]) -> CheckoutSessionObject {
        CheckoutSessionObject {
            id: "cs_1".to_string(),
            client_reference_id: Some("user_1".to_string()),
            customer: Some("cus_1".to_string()),
            customer_email: None,
            subscription: Some("sub_1".to_string()),
            payment_status: Some("paid".to_string()),
            amount_total: Some(4999),
            currency: Some("usd".to_string()),
            metadata: metadata(meta),
        }
    }

    fn subscription(status: &str, meta: &[(&str, &str)]) -> SubscriptionObject {
        SubscriptionObject {
            id: "sub_1".to_string(),
            customer: Some("cus_1".to_string()),
            status: status.to_string(),
            current_period_end: Some(1_706_745_600), // 2024-02-01
            cancel_at_period_end: false,
            metadata: metadata(meta),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout Completed
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_completed_activates_plan_from_metadata() {
        let store = MockProfileStore::new();
        let reconciler = reconciler(&store);

        let result = reconciler
            .on_checkout_completed(
                &session(&[("plan_id", "pb_company"), ("billing_period", "monthly")]),
                at(PAID_AT),
            )
            .await
            .unwrap();

        assert_eq!(result.plan_id.as_str(), "pb_company");
        assert_eq!(result.status, SyncStatus::Active);

        let patch = store.last_patch_for("user_1").unwrap();
        assert_eq!(patch.subscription_status, "active");
        assert_eq!(patch.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(patch.stripe_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(patch.subscription_end_date, "2024-02-01T00:00:00+00:00");
        assert_eq!(
            patch.last_payment_date.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn checkout_completed_yearly_adds_twelve_months() {
        let store = MockProfileStore::new();

        reconciler(&store)
            .on_checkout_completed(
                &session(&[("plan_id", "pb_company"), ("billing_period", "yearly")]),
                at(PAID_AT),
            )
            .await
            .unwrap();

        let patch = store.last_patch_for("user_1").unwrap();
        assert_eq!(patch.subscription_end_date, "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn checkout_completed_twice_writes_identical_patches() {
        let store = MockProfileStore::new();
        let reconciler = reconciler(&store);
        let session = session(&[("plan_name", "Company"), ("billing_period", "monthly")]);

        reconciler
            .on_checkout_completed(&session, at(PAID_AT))
            .await
            .unwrap();
        reconciler
            .on_checkout_completed(&session, at(PAID_AT))
            .await
            .unwrap();

        let patches = store.patches();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0], patches[1]);
    }

    #[tokio::test]
    async fn checkout_completed_maps_plan_name_through_catalog() {
        let store = MockProfileStore::new();

        let result = reconciler(&store)
            .on_checkout_completed(&session(&[("plan_name", "Individual")]), at(PAID_AT))
            .await
            .unwrap();

        assert_eq!(result.plan_id.as_str(), "pb_individual");
        assert_eq!(store.plan_lookups(), 0);
    }

    #[tokio::test]
    async fn checkout_completed_falls_back_to_profile_store_plans() {
        let store = MockProfileStore::new().with_plan("pb_legacy", "Legacy Pro");

        let result = reconciler(&store)
            .on_checkout_completed(&session(&[("plan_name", "Legacy Pro")]), at(PAID_AT))
            .await
            .unwrap();

        assert_eq!(result.plan_id.as_str(), "pb_legacy");
        assert_eq!(store.plan_lookups(), 1);
    }

    #[tokio::test]
    async fn checkout_completed_with_unmapped_plan_writes_nothing() {
        let store = MockProfileStore::new();

        let err = reconciler(&store)
            .on_checkout_completed(&session(&[("plan_name", "Gold")]), at(PAID_AT))
            .await
            .unwrap_err();

        assert_eq!(err, ReconcileError::UnmappedPlan("Gold".to_string()));
        assert!(store.patches().is_empty());
    }

    #[tokio::test]
    async fn checkout_completed_uses_metadata_user_when_reference_missing() {
        let store = MockProfileStore::new();
        let mut session = session(&[("plan_id", "pb_company"), ("user_id", "user_meta")]);
        session.client_reference_id = None;

        reconciler(&store)
            .on_checkout_completed(&session, at(PAID_AT))
            .await
            .unwrap();

        assert!(store.last_patch_for("user_meta").is_some());
    }

    #[tokio::test]
    async fn checkout_completed_without_user_is_error() {
        let store = MockProfileStore::new();
        let mut session = session(&[("plan_id", "pb_company")]);
        session.client_reference_id = None;

        let err = reconciler(&store)
            .on_checkout_completed(&session, at(PAID_AT))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::MissingUserId { .. }));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn profile_store_failure_is_reported() {
        let store =
            MockProfileStore::new().failing_patches(ProfileStoreError::from_status(503, "down"));

        let err = reconciler(&store)
            .on_checkout_completed(&session(&[("plan_id", "pb_company")]), at(PAID_AT))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::ProfileStore(_)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Subscription Lifecycle
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn active_update_mirrors_provider_period_end() {
        let store = MockProfileStore::new();

        let result = reconciler(&store)
            .on_subscription_updated(
                &subscription("active", &[("user_id", "user_1"), ("plan_name", "Company")]),
                at(PAID_AT),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.plan_id.as_str(), "pb_company");
        let patch = store.last_patch_for("user_1").unwrap();
        assert_eq!(patch.subscription_status, "active");
        assert_eq!(patch.subscription_end_date, "2024-02-01T00:00:00+00:00");
        assert!(patch.last_payment_date.is_none());
    }

    #[tokio::test]
    async fn inactive_update_downgrades() {
        let store = MockProfileStore::new();

        reconciler(&store)
            .on_subscription_updated(
                &subscription("past_due", &[("user_id", "user_1"), ("plan_name", "Company")]),
                at(PAID_AT),
            )
            .await
            .unwrap();

        let patch = store.last_patch_for("user_1").unwrap();
        assert_eq!(patch.plan.as_str(), "pb_free");
        assert_eq!(patch.subscription_status, "cancelled");
    }

    #[tokio::test]
    async fn update_without_user_is_skipped() {
        let store = MockProfileStore::new();

        let result = reconciler(&store)
            .on_subscription_updated(&subscription("active", &[]), at(PAID_AT))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn active_update_without_period_end_is_error() {
        let store = MockProfileStore::new();
        let mut sub = subscription("active", &[("user_id", "user_1"), ("plan_id", "pb_company")]);
        sub.current_period_end = None;

        let err = reconciler(&store)
            .on_subscription_updated(&sub, at(PAID_AT))
            .await
            .unwrap_err();

        assert_eq!(err, ReconcileError::MissingPeriodEnd("sub_1".to_string()));
        assert!(store.patches().is_empty());
    }

    #[tokio::test]
    async fn created_without_user_is_observed_only() {
        let store = MockProfileStore::new();

        let result = reconciler(&store)
            .on_subscription_created(&subscription("active", &[]), at(PAID_AT))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn deleted_with_unknown_plan_still_downgrades_to_free() {
        let store = MockProfileStore::new();

        reconciler(&store)
            .on_subscription_deleted(
                &subscription("canceled", &[("user_id", "user_1"), ("plan_name", "Gold")]),
                at(PAID_AT),
            )
            .await
            .unwrap();

        let patch = store.last_patch_for("user_1").unwrap();
        assert_eq!(patch.plan.as_str(), "pb_free");
        assert_eq!(patch.subscription_status, "cancelled");
        assert_eq!(patch.subscription_end_date, "2024-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn deleted_without_user_is_skipped() {
        let store = MockProfileStore::new();

        let result = reconciler(&store)
            .on_subscription_deleted(&subscription("canceled", &[]), at(PAID_AT))
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.patches().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn dispatch_uses_event_time() {
        let store = MockProfileStore::new();
        let event = VerifiedEvent {
            id: "evt_1".to_string(),
            created: PAID_AT,
            livemode: false,
            payload: ProviderEvent::CheckoutCompleted(session(&[("plan_id", "pb_company")])),
        };

        reconciler(&store).dispatch(&event).await.unwrap();

        let patch = store.last_patch_for("user_1").unwrap();
        assert_eq!(
            patch.last_payment_date.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn dispatch_invoice_events_write_nothing() {
        let store = MockProfileStore::new();
        let invoice = InvoiceObject {
            id: "in_1".to_string(),
            customer: Some("cus_1".to_string()),
            subscription: Some("sub_1".to_string()),
            amount_paid: 4999,
            amount_due: 4999,
            currency: Some("usd".to_string()),
        };

        for payload in [
            ProviderEvent::PaymentSucceeded(invoice.clone()),
            ProviderEvent::PaymentFailed(invoice),
        ] {
            let event = VerifiedEvent {
                id: "evt_inv".to_string(),
                created: PAID_AT,
                livemode: false,
                payload,
            };
            assert!(reconciler(&store).dispatch(&event).await.unwrap().is_none());
        }

        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn reconcile_errors_map_to_billing_errors() {
        assert_eq!(
            BillingError::from(ReconcileError::ProfileStore(ProfileStoreError::Network(
                "x".into()
            )))
            .code(),
            crate::domain::foundation::ErrorCode::ProfileStoreUnavailable
        );
        assert_eq!(
            BillingError::from(ReconcileError::UnmappedPlan("Gold".into())),
            BillingError::unmapped_plan("Gold")
        );
    }
}
