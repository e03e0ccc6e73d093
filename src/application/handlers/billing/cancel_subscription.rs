//! CancelSubscriptionHandler - Command handler for cancelling at period end.
//!
//! The profile store is not touched here; the provider's
//! `customer.subscription.deleted` event performs the downgrade when the
//! period actually ends.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::PaymentProvider;

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelSubscriptionResult {
    pub subscription_id: String,
    /// Last day of access, `YYYY-MM-DD`.
    pub effective_date: Option<String>,
}

impl CancelSubscriptionResult {
    pub fn message(&self) -> String {
        match &self.effective_date {
            Some(date) => format!(
                "Subscription will be cancelled at the end of the billing period ({})",
                date
            ),
            None => "Subscription will be cancelled at the end of the billing period".to_string(),
        }
    }
}

pub struct CancelSubscriptionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CancelSubscriptionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        // 1. Find the user's subscription
        let subscription = self
            .payment_provider
            .find_subscription_for_user(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::no_active_subscription(cmd.user_id.clone()))?;

        // 2. Cancel at period end
        let cancelled = self
            .payment_provider
            .cancel_subscription(&subscription.id, true)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %cmd.user_id,
                    subscription_id = %subscription.id,
                    error_code = %e.code,
                    provider_code = ?e.provider_code,
                    "Subscription cancellation failed"
                );
                BillingError::from(e)
            })?;

        let effective_date = cancelled
            .current_period_end
            .or(subscription.current_period_end)
            .and_then(Timestamp::from_unix_secs)
            .map(|t| t.to_date_string());

        tracing::info!(
            user_id = %cmd.user_id,
            subscription_id = %cancelled.id,
            effective_date = ?effective_date,
            "Subscription set to cancel at period end"
        );

        Ok(CancelSubscriptionResult {
            subscription_id: cancelled.id,
            effective_date,
        })
    }
}
