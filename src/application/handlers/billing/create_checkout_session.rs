//! CreateCheckoutSessionHandler - Command handler for opening a checkout session.

use std::sync::Arc;

use crate::domain::billing::{
    build_session_request, BillingError, CheckoutRequest, PlanCatalog, PricingPolicy,
};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::PaymentProvider;

/// Command to open a checkout session for the requester.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionCommand {
    pub requester: AuthenticatedUser,
    pub request: CheckoutRequest,
}

/// Session the client should redirect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionCreated {
    pub session_id: String,
    pub url: String,
}

/// Handler for creating checkout sessions.
pub struct CreateCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    catalog: Arc<PlanCatalog>,
    pricing_policy: PricingPolicy,
}

impl CreateCheckoutSessionHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        catalog: Arc<PlanCatalog>,
        pricing_policy: PricingPolicy,
    ) -> Self {
        Self {
            payment_provider,
            catalog,
            pricing_policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CheckoutSessionCreated, BillingError> {
        // 1. Validate and shape the provider request
        let session_request = build_session_request(
            &cmd.request,
            &cmd.requester,
            &self.catalog,
            self.pricing_policy,
        )
        .map_err(BillingError::validation)?;

        // 2. Open the session
        let session = self
            .payment_provider
            .create_checkout_session(&session_request)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %cmd.requester.id,
                    plan_id = %cmd.request.plan_id,
                    error_code = %e.code,
                    provider_code = ?e.provider_code,
                    retryable = e.retryable,
                    "Checkout session creation failed"
                );
                BillingError::from(e)
            })?;

        tracing::info!(
            user_id = %cmd.requester.id,
            session_id = %session.id,
            plan_id = %cmd.request.plan_id,
            unit_amount = session_request.line_item.unit_amount,
            interval = session_request.line_item.interval,
            "Checkout session created"
        );

        Ok(CheckoutSessionCreated {
            session_id: session.id,
            url: session.url,
        })
    }
}
