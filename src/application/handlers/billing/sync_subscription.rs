//! SyncSubscriptionHandler - Forces the user record to match the provider.

use std::sync::Arc;

use crate::domain::billing::{BillingError, PlanCatalog, SubscriptionObject, SubscriptionSyncResult};
use crate::domain::foundation::{PlanId, Timestamp, UserId};
use crate::ports::{PaymentProvider, ProfileStore, Subscription};

use super::reconciler::SubscriptionReconciler;

#[derive(Debug, Clone)]
pub struct SyncSubscriptionCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSubscriptionResult {
    /// Status written to the user record.
    pub status: String,
    pub plan_id: PlanId,
}

impl From<SubscriptionSyncResult> for SyncSubscriptionResult {
    fn from(result: SubscriptionSyncResult) -> Self {
        Self {
            status: result.status.as_str().to_string(),
            plan_id: result.plan_id,
        }
    }
}

pub struct SyncSubscriptionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    reconciler: SubscriptionReconciler,
}

impl SyncSubscriptionHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        profile_store: Arc<dyn ProfileStore>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            payment_provider,
            reconciler: SubscriptionReconciler::new(catalog, profile_store),
        }
    }

    pub async fn handle(
        &self,
        cmd: SyncSubscriptionCommand,
    ) -> Result<SyncSubscriptionResult, BillingError> {
        let now = Timestamp::now();

        let subscription = self
            .payment_provider
            .find_subscription_for_user(&cmd.user_id)
            .await?;

        let result = match subscription {
            Some(subscription) if subscription.status.has_access_now() => {
                let object = to_subscription_object(subscription);
                match self.reconciler.on_subscription_updated(&object, now).await? {
                    Some(result) => result,
                    None => self.reconciler.downgrade(cmd.user_id.clone(), now).await?,
                }
            }
            Some(subscription) => {
                let object = to_subscription_object(subscription);
                self.reconciler
                    .on_subscription_inactive(cmd.user_id.clone(), &object, now)
                    .await?
            }
            None => {
                tracing::info!(user_id = %cmd.user_id, "No subscription at provider; downgrading");
                self.reconciler.downgrade(cmd.user_id.clone(), now).await?
            }
        };

        tracing::info!(
            user_id = %cmd.user_id,
            plan_id = %result.plan_id,
            subscription_status = result.status.as_str(),
            "Subscription synced"
        );

        Ok(result.into())
    }
}

fn to_subscription_object(subscription: Subscription) -> SubscriptionObject {
    SubscriptionObject {
        status: subscription.status.as_str().to_string(),
        id: subscription.id,
        customer: subscription.customer_id,
        current_period_end: subscription.current_period_end,
        cancel_at_period_end: subscription.cancel_at_period_end,
        metadata: subscription.metadata,
    }
}
