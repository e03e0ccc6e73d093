//! VerifyCheckoutSessionHandler - Query handler for a returning checkout.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::billing::{cents_to_major, BillingError};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::PaymentProvider;

/// Query for a checkout session the requester just returned from.
#[derive(Debug, Clone)]
pub struct VerifyCheckoutSessionQuery {
    pub requester: AuthenticatedUser,
    pub session_id: String,
}

/// Session state as shown to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionVerified {
    /// Provider payment status (`paid`, `unpaid`, `no_payment_required`).
    pub status: Option<String>,
    pub customer_email: Option<String>,
    /// Total in major units.
    pub amount_total: Option<f64>,
    pub currency: Option<String>,
    pub metadata: HashMap<String, String>,
}

pub struct VerifyCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl VerifyCheckoutSessionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        query: VerifyCheckoutSessionQuery,
    ) -> Result<CheckoutSessionVerified, BillingError> {
        let session = self
            .payment_provider
            .get_checkout_session(&query.session_id)
            .await?
            .ok_or_else(|| BillingError::session_not_found(&query.session_id))?;

        // Another user's session is indistinguishable from a missing one.
        if let Some(owner) = session.user_id() {
            if owner != query.requester.id.as_str() {
                tracing::warn!(
                    user_id = %query.requester.id,
                    session_id = %query.session_id,
                    "Session belongs to another user"
                );
                return Err(BillingError::session_not_found(&query.session_id));
            }
        }

        Ok(CheckoutSessionVerified {
            status: session.payment_status,
            customer_email: session.customer_email,
            amount_total: session.amount_total.map(cents_to_major),
            currency: session.currency,
            metadata: session.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::foundation::{ErrorCode, UserId};
    use crate::ports::{CheckoutSessionDetails, PaymentError};

    fn requester(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new(id).unwrap(), None)
    }

    fn session(owner: &str) -> CheckoutSessionDetails {
        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), owner.to_string());
        metadata.insert("plan_name".to_string(), "Company".to_string());
        CheckoutSessionDetails {
            id: "cs_1".to_string(),
            payment_status: Some("paid".to_string()),
            customer_email: Some("buyer@example.com".to_string()),
            amount_total: Some(4999),
            currency: Some("usd".to_string()),
            metadata,
        }
    }

    fn query(user: &str, session_id: &str) -> VerifyCheckoutSessionQuery {
        VerifyCheckoutSessionQuery {
            requester: requester(user),
            session_id: session_id.to_string(),
        }
    }

    #[tokio::test]
    async fn returns_amount_in_major_units() {
        let provider = MockPaymentProvider::new();
        provider.add_session(session("user_1"));
        let handler = VerifyCheckoutSessionHandler::new(Arc::new(provider));

        let verified = handler.handle(query("user_1", "cs_1")).await.unwrap();

        assert_eq!(verified.status.as_deref(), Some("paid"));
        assert_eq!(verified.amount_total, Some(49.99));
        assert_eq!(verified.customer_email.as_deref(), Some("buyer@example.com"));
        assert_eq!(verified.metadata.get("plan_name").map(String::as_str), Some("Company"));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let handler = VerifyCheckoutSessionHandler::new(Arc::new(MockPaymentProvider::new()));

        let err = handler.handle(query("user_1", "cs_missing")).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn foreign_session_is_not_found() {
        let provider = MockPaymentProvider::new();
        provider.add_session(session("user_2"));
        let handler = VerifyCheckoutSessionHandler::new(Arc::new(provider));

        let err = handler.handle(query("user_1", "cs_1")).await.unwrap_err();

        assert_eq!(err, BillingError::session_not_found("cs_1"));
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let provider = MockPaymentProvider::new();
        provider.set_method_error("get_checkout_session", PaymentError::network("timeout"));
        let handler = VerifyCheckoutSessionHandler::new(Arc::new(provider));

        let err = handler.handle(query("user_1", "cs_1")).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::PaymentProviderError);
    }
}
