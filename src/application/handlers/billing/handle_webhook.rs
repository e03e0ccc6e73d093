//! HandleWebhookHandler - Command handler for payment provider webhooks.
//!
//! Verification failures reject the delivery. Anything that goes wrong after
//! verification is logged and the delivery is still acknowledged, since the
//! provider would otherwise keep retrying a delivery we cannot apply.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::billing::{PlanCatalog, WebhookError};
use crate::ports::{PaymentProvider, ProfileStore};

use super::reconciler::SubscriptionReconciler;

/// Command to handle a webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// What happened to a verified delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Subscription state was written to the profile store.
    Applied,
    /// Reconciliation failed; the failure was logged and the write skipped.
    ApplyFailed,
    /// Nothing to apply for this kind (unknown, or observability only).
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Applied => "applied",
            WebhookOutcome::ApplyFailed => "apply_failed",
            WebhookOutcome::Ignored => "ignored",
        }
    }
}

impl fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement of a verified delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookAck {
    pub event_id: String,
    pub kind: String,
    pub outcome: WebhookOutcome,
}

/// Handler for webhook deliveries.
pub struct HandleWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    reconciler: SubscriptionReconciler,
}

impl HandleWebhookHandler {
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

    pub async fn handle(&self, cmd: HandleWebhookCommand) -> Result<WebhookAck, WebhookError> {
        let delivery_id = Uuid::new_v4();
        tracing::debug!(
            delivery_id = %delivery_id,
            payload_bytes = cmd.payload.len(),
            "Webhook received"
        );

        // 1. Verify signature and decode (rejections never reach the store)
        let event = self
            .payment_provider
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await
            .map_err(|e| {
                tracing::warn!(delivery_id = %delivery_id, error = %e, "Webhook rejected");
                e
            })?;

        let kind = event.payload.kind().to_string();
        tracing::info!(
            delivery_id = %delivery_id,
            event_id = %event.id,
            event_type = %kind,
            livemode = event.livemode,
            "Webhook verified"
        );

        // 2. Dispatch
        let outcome = match self.reconciler.dispatch(&event).await {
            Ok(Some(result)) => {
                tracing::info!(
                    delivery_id = %delivery_id,
                    event_id = %event.id,
                    user_id = %result.user_id,
                    plan_id = %result.plan_id,
                    subscription_status = result.status.as_str(),
                    "Subscription state applied"
                );
                WebhookOutcome::Applied
            }
            Ok(None) => WebhookOutcome::Ignored,
            Err(e) => {
                tracing::error!(
                    delivery_id = %delivery_id,
                    event_id = %event.id,
                    event_type = %kind,
                    error = %e,
                    "Webhook reconciliation failed; acknowledging anyway"
                );
                WebhookOutcome::ApplyFailed
            }
        };

        tracing::debug!(
            delivery_id = %delivery_id,
            event_id = %event.id,
            outcome = %outcome,
            "Webhook dispatched"
        );

        Ok(WebhookAck {
            event_id: event.id,
            kind,
            outcome,
        })
    }
}
