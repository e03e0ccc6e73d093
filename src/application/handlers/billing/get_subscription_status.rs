//! GetSubscriptionStatusHandler - Query handler for the requester's subscription.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::PaymentProvider;

/// Plan name reported when the subscription carries none.
pub const UNKNOWN_PLAN_NAME: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusQuery {
    pub user_id: UserId,
}

/// Subscription summary for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatusResult {
    None,
    Found {
        subscription_id: String,
        status: String,
        plan_name: String,
        /// `YYYY-MM-DD`
        current_period_end: Option<String>,
        cancel_at_period_end: bool,
    },
}

impl SubscriptionStatusResult {
    pub fn has_subscription(&self) -> bool {
        matches!(self, SubscriptionStatusResult::Found { .. })
    }
}

pub struct GetSubscriptionStatusHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl GetSubscriptionStatusHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionStatusQuery,
    ) -> Result<SubscriptionStatusResult, BillingError> {
        let Some(subscription) = self
            .payment_provider
            .find_subscription_for_user(&query.user_id)
            .await?
        else {
            tracing::debug!(user_id = %query.user_id, "No subscription found");
            return Ok(SubscriptionStatusResult::None);
        };

        let current_period_end = subscription
            .current_period_end
            .and_then(Timestamp::from_unix_secs)
            .map(|t| t.to_date_string());

        Ok(SubscriptionStatusResult::Found {
            plan_name: subscription
                .plan_name()
                .unwrap_or(UNKNOWN_PLAN_NAME)
                .to_string(),
            status: subscription.status.as_str().to_string(),
            subscription_id: subscription.id,
            current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::stripe::{subscription_fixture, MockPaymentProvider};

    fn query(user: &str) -> GetSubscriptionStatusQuery {
        GetSubscriptionStatusQuery {
            user_id: UserId::new(user).unwrap(),
        }
    }

    #[tokio::test]
    async fn reports_no_subscription() {
        let handler = GetSubscriptionStatusHandler::new(Arc::new(MockPaymentProvider::new()));

        let result = handler.handle(query("user_1")).await.unwrap();

        assert_eq!(result, SubscriptionStatusResult::None);
        assert!(!result.has_subscription());
    }

    #[tokio::test]
    async fn reports_active_subscription_with_date() {
        let provider = MockPaymentProvider::with_subscription("sub_1", "user_1", "active", "Company");
        let handler = GetSubscriptionStatusHandler::new(Arc::new(provider));

        let result = handler.handle(query("user_1")).await.unwrap();

        assert_eq!(
            result,
            SubscriptionStatusResult::Found {
                subscription_id: "sub_1".to_string(),
                status: "active".to_string(),
                plan_name: "Company".to_string(),
                current_period_end: Some("2024-02-01".to_string()),
                cancel_at_period_end: false,
            }
        );
    }

    #[tokio::test]
    async fn prefers_active_over_older_canceled() {
        let provider =
            MockPaymentProvider::with_subscription("sub_old", "user_1", "canceled", "Individual");
        provider.add_subscription(subscription_fixture("sub_new", "user_1", "active", "Company"));
        let handler = GetSubscriptionStatusHandler::new(Arc::new(provider));

        let result = handler.handle(query("user_1")).await.unwrap();

        let SubscriptionStatusResult::Found { subscription_id, .. } = result else {
            panic!("expected a subscription");
        };
        assert_eq!(subscription_id, "sub_new");
    }

    #[tokio::test]
    async fn missing_plan_name_is_unknown() {
        let provider = MockPaymentProvider::new();
        let mut sub = subscription_fixture("sub_1", "user_1", "trialing", "x");
        sub.metadata.remove("plan_name");
        provider.add_subscription(sub);
        let handler = GetSubscriptionStatusHandler::new(Arc::new(provider));

        let result = handler.handle(query("user_1")).await.unwrap();

        let SubscriptionStatusResult::Found { plan_name, status, .. } = result else {
            panic!("expected a subscription");
        };
        assert_eq!(plan_name, UNKNOWN_PLAN_NAME);
        assert_eq!(status, "trialing");
    }
}
