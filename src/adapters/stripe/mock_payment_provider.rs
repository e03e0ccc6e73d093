//! In-memory [`PaymentProvider`] that records every call.
//!
//! Clones share state, so a test can hand one clone to a handler and
//! inspect the other afterwards. Webhooks are decoded without a signature
//! check unless the mock is built with [`MockPaymentProvider::with_webhook_secret`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::billing::{
    CheckoutSessionRequest, StripeEvent, StripeWebhookVerifier, VerifiedEvent, WebhookError,
};
use crate::ports::{
    CheckoutSession, CheckoutSessionDetails, PaymentError, PaymentProvider, Subscription,
    SubscriptionStatus,
};

#[derive(Clone, Default)]
pub struct MockPaymentProvider {
    shared: Arc<Mutex<Ledger>>,
    verifier: Option<StripeWebhookVerifier>,
}

#[derive(Default)]
struct Ledger {
    subscriptions: Vec<Subscription>,
    sessions: HashMap<String, CheckoutSessionDetails>,
    next_checkout: Option<CheckoutSession>,
    checkout_requests: Vec<CheckoutSessionRequest>,
    failures: HashMap<String, PaymentError>,
    calls: Vec<MethodCall>,
    issued: u32,
}

/// One trait call as seen by the mock, with its arguments stringified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies webhook signatures with `secret` exactly as the Stripe adapter does.
    pub fn with_webhook_secret(secret: &str) -> Self {
        Self {
            verifier: Some(StripeWebhookVerifier::new(SecretString::new(secret.to_string()))),
            ..Self::default()
        }
    }

    /// Holds a single [`subscription_fixture`].
    pub fn with_subscription(
        subscription_id: &str,
        user_id: &str,
        status: &str,
        plan_name: &str,
    ) -> Self {
        let mock = Self::new();
        mock.add_subscription(subscription_fixture(subscription_id, user_id, status, plan_name));
        mock
    }

    /// Appended in listing order.
    pub fn add_subscription(&self, subscription: Subscription) {
        self.ledger().subscriptions.push(subscription);
    }

    pub fn add_session(&self, session: CheckoutSessionDetails) {
        self.ledger().sessions.insert(session.id.clone(), session);
    }

    /// Returned by the next `create_checkout_session` instead of a generated one.
    pub fn set_checkout_session(&self, session: CheckoutSession) {
        self.ledger().next_checkout = Some(session);
    }

    /// Every later call to `method` fails with `error`.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.ledger().failures.insert(method.to_string(), error);
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        self.ledger().calls.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.ledger().calls.iter().any(|call| call.method == method)
    }

    pub fn checkout_requests(&self) -> Vec<CheckoutSessionRequest> {
        self.ledger().checkout_requests.clone()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs the call, then fails if an error was injected for `method`.
    fn enter(&self, method: &str, args: Vec<String>) -> Result<MutexGuard<'_, Ledger>, PaymentError> {
        let mut ledger = self.ledger();
        ledger.calls.push(MethodCall {
            method: method.to_string(),
            args,
        });
        if let Some(error) = ledger.failures.get(method).cloned() {
            return Err(error);
        }
        Ok(ledger)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut ledger = self.enter(
            "create_checkout_session",
            vec![
                request.client_reference_id.to_string(),
                request.line_item.unit_amount.to_string(),
            ],
        )?;
        ledger.checkout_requests.push(request.clone());
        ledger.issued += 1;

        if let Some(session) = ledger.next_checkout.take() {
            return Ok(session);
        }
        let id = format!("cs_mock_{}", ledger.issued);
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{id}"),
            id,
        })
    }

    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, PaymentError> {
        let ledger = self.enter("get_checkout_session", vec![session_id.to_string()])?;
        Ok(ledger.sessions.get(session_id).cloned())
    }

    async fn list_subscriptions(&self, limit: u8) -> Result<Vec<Subscription>, PaymentError> {
        let ledger = self.enter("list_subscriptions", vec![limit.to_string()])?;
        Ok(ledger.subscriptions.iter().take(usize::from(limit)).cloned().collect())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, PaymentError> {
        let ledger = self.enter("get_subscription", vec![subscription_id.to_string()])?;
        Ok(ledger
            .subscriptions
            .iter()
            .find(|sub| sub.id == subscription_id)
            .cloned())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<Subscription, PaymentError> {
        let mut ledger = self.enter(
            "cancel_subscription",
            vec![subscription_id.to_string(), at_period_end.to_string()],
        )?;
        let Some(sub) = ledger
            .subscriptions
            .iter_mut()
            .find(|sub| sub.id == subscription_id)
        else {
            return Err(PaymentError::not_found("Subscription"));
        };

        sub.cancel_at_period_end = at_period_end;
        if !at_period_end {
            sub.status = SubscriptionStatus::Canceled;
        }
        Ok(sub.clone())
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VerifiedEvent, WebhookError> {
        self.ledger().calls.push(MethodCall {
            method: "verify_webhook".to_string(),
            args: vec![signature.to_string()],
        });

        match &self.verifier {
            Some(verifier) => verifier.verify(payload, signature),
            None => {
                let event: StripeEvent = serde_json::from_slice(payload)
                    .map_err(|e| WebhookError::ParseError(e.to_string()))?;
                VerifiedEvent::from_stripe_event(&event)
            }
        }
    }
}

/// Subscription carrying `user_id` and `plan_name` metadata; the period
/// ends 2024-02-01T00:00:00Z.
pub fn subscription_fixture(
    subscription_id: &str,
    user_id: &str,
    status: &str,
    plan_name: &str,
) -> Subscription {
    let metadata = HashMap::from([
        ("user_id".to_string(), user_id.to_string()),
        ("plan_name".to_string(), plan_name.to_string()),
    ]);

    Subscription {
        id: subscription_id.to_string(),
        customer_id: Some("cus_mock".to_string()),
        status: SubscriptionStatus::parse(status),
        current_period_end: Some(1_706_745_600),
        cancel_at_period_end: false,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::webhook_verifier::test_signature_header;
    use crate::domain::billing::LineItem;
    use crate::domain::foundation::UserId;
    use crate::ports::PaymentErrorCode;

    #[tokio::test]
    async fn user_lookup_goes_through_the_listing() {
        let mock = MockPaymentProvider::with_subscription("sub_1", "u1", "active", "Company");
        mock.add_subscription(subscription_fixture("sub_2", "u2", "active", "Individual"));

        let found = mock
            .find_subscription_for_user(&UserId::new("u2").unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, "sub_2");
        assert_eq!(
            mock.calls(),
            vec![MethodCall {
                method: "list_subscriptions".to_string(),
                args: vec!["10".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn generated_sessions_are_numbered() {
        let mock = MockPaymentProvider::new();
        let request = CheckoutSessionRequest {
            line_item: LineItem {
                currency: "usd".to_string(),
                product_name: "Company".to_string(),
                description: "Company plan".to_string(),
                unit_amount: 4999,
                interval: "month",
                quantity: 1,
            },
            success_url: "https://app.example.com/ok".to_string(),
            cancel_url: "https://app.example.com/back".to_string(),
            client_reference_id: UserId::new("u1").unwrap(),
            customer_email: "u1@example.com".to_string(),
            metadata: Default::default(),
        };

        let first = mock.create_checkout_session(&request).await.unwrap();
        let second = mock.create_checkout_session(&request).await.unwrap();

        assert_eq!(first.id, "cs_mock_1");
        assert_eq!(second.url, "https://checkout.stripe.com/c/pay/cs_mock_2");
        assert_eq!(mock.checkout_requests().len(), 2);
    }

    #[tokio::test]
    async fn cancel_at_period_end_leaves_status_alone() {
        let mock = MockPaymentProvider::with_subscription("sub_1", "u1", "active", "Company");

        let sub = mock.cancel_subscription("sub_1", true).await.unwrap();
        assert!(sub.cancel_at_period_end);
        assert_eq!(sub.status, SubscriptionStatus::Active);

        let sub = mock.cancel_subscription("sub_1", false).await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
    }

    #[tokio::test]
    async fn cancelling_a_stranger_is_not_found() {
        let err = MockPaymentProvider::new()
            .cancel_subscription("sub_x", true)
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::NotFound);
    }

    #[tokio::test]
    async fn injected_failure_is_still_logged() {
        let mock = MockPaymentProvider::new();
        mock.set_method_error("list_subscriptions", PaymentError::network("down"));

        assert!(mock.list_subscriptions(10).await.is_err());
        assert!(mock.was_called("list_subscriptions"));
        assert!(mock.get_subscription("sub_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unsigned_mock_decodes_payload() {
        let payload = br#"{"id":"evt_1","type":"ping","created":1704067200,"data":{"object":{}}}"#;

        let event = MockPaymentProvider::new().verify_webhook(payload, "").await.unwrap();

        assert_eq!(event.id, "evt_1");
    }

    #[tokio::test]
    async fn secret_mock_checks_signatures() {
        let mock = MockPaymentProvider::with_webhook_secret("whsec_mock");
        let payload = r#"{"id":"evt_1","type":"ping","created":1704067200,"data":{"object":{}}}"#;
        let now = chrono::Utc::now().timestamp();

        let good = test_signature_header("whsec_mock", now, payload);
        let bad = test_signature_header("whsec_other", now, payload);

        assert!(mock.verify_webhook(payload.as_bytes(), &good).await.is_ok());
        assert_eq!(
            mock.verify_webhook(payload.as_bytes(), &bad).await.unwrap_err(),
            WebhookError::InvalidSignature
        );
    }
}
