//! Outbound contract with the payment gateway.
//!
//! Hosted checkout, subscription reads and cancellation, and webhook
//! verification. `StripePaymentAdapter` talks to the real API and
//! `MockPaymentProvider` records calls for tests.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::billing::{BillingError, CheckoutSessionRequest, VerifiedEvent, WebhookError};
use crate::domain::foundation::UserId;

/// Number of subscriptions scanned when looking one up by user.
pub const SUBSCRIPTION_SCAN_LIMIT: u8 = 10;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Returns the session id and the URL the customer is redirected to.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// `Ok(None)` when the provider has no such session.
    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, PaymentError>;

    /// Newest first.
    async fn list_subscriptions(&self, limit: u8) -> Result<Vec<Subscription>, PaymentError>;

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, PaymentError>;

    /// With `at_period_end` the subscription stays active until the period closes.
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<Subscription, PaymentError>;

    /// Checks the `Stripe-Signature` header against the raw body before parsing.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VerifiedEvent, WebhookError>;

    /// Scans the latest [`SUBSCRIPTION_SCAN_LIMIT`] subscriptions for the
    /// user's `user_id` metadata, preferring an active one.
    async fn find_subscription_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, PaymentError> {
        let subscriptions = self.list_subscriptions(SUBSCRIPTION_SCAN_LIMIT).await?;
        Ok(select_user_subscription(subscriptions, user_id))
    }
}

/// Picks the user's active subscription, else their first one.
pub fn select_user_subscription(
    subscriptions: Vec<Subscription>,
    user_id: &UserId,
) -> Option<Subscription> {
    let mut owned: Vec<Subscription> = subscriptions
        .into_iter()
        .filter(|s| s.user_id() == Some(user_id.as_str()))
        .collect();

    match owned.iter().position(|s| s.status.has_access_now()) {
        Some(idx) => Some(owned.swap_remove(idx)),
        None => owned.into_iter().next(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Checkout session as reported back by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionDetails {
    pub id: String,
    pub payment_status: Option<String>,
    pub customer_email: Option<String>,
    /// Minor units.
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionDetails {
    /// User that created the session, from metadata.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: SubscriptionStatus,
    /// Unix seconds.
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,

    /// Metadata copied from the checkout session.
    pub metadata: HashMap<String, String>,
}

impl Subscription {
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }

    pub fn plan_name(&self) -> Option<&str> {
        self.metadata.get("plan_name").map(String::as_str)
    }

    pub fn plan_id(&self) -> Option<&str> {
        self.metadata.get("plan_id").map(String::as_str)
    }
}

/// Stripe subscription status; unrecognised values survive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Trialing,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
    Other(String),
}

impl SubscriptionStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            "trialing" => SubscriptionStatus::Trialing,
            "incomplete" => SubscriptionStatus::Incomplete,
            "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
            "unpaid" => SubscriptionStatus::Unpaid,
            "paused" => SubscriptionStatus::Paused,
            other => SubscriptionStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Other(s) => s,
        }
    }

    /// Only `active` keeps a paid plan on the user record.
    pub fn has_access_now(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        SubscriptionStatus::parse(&s)
    }
}

impl From<SubscriptionStatus> for String {
    fn from(s: SubscriptionStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Stripe's `error.code`, or `error.type` when no code was sent.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(self, provider_code: impl Into<String>) -> Self {
        Self {
            provider_code: Some(provider_code.into()),
            ..self
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{resource} not found"))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::DecodeError, message)
    }
}

impl From<PaymentError> for BillingError {
    fn from(err: PaymentError) -> Self {
        BillingError::payment_provider(err.message, err.provider_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentErrorCode {
    NetworkError,
    AuthenticationError,
    InvalidRequest,
    NotFound,
    RateLimitExceeded,
    DecodeError,
    ProviderError,
}

impl PaymentErrorCode {
    /// Transport failures, throttling and 5xx may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimitExceeded | Self::ProviderError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::AuthenticationError => "authentication_error",
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::DecodeError => "decode_error",
            Self::ProviderError => "provider_error",
        }
    }
}

impl fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(id: &str, user: &str, status: &str) -> Subscription {
        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user.to_string());
        Subscription {
            id: id.to_string(),
            customer_id: None,
            status: SubscriptionStatus::parse(status),
            current_period_end: None,
            cancel_at_period_end: false,
            metadata,
        }
    }

    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn PaymentProvider) {}
    }

    #[test]
    fn subscription_status_keeps_unknown_values_verbatim() {
        let status = SubscriptionStatus::parse("something_new");
        assert_eq!(status.as_str(), "something_new");
        assert_eq!(SubscriptionStatus::parse("past_due"), SubscriptionStatus::PastDue);
    }

    #[test]
    fn subscription_status_serializes_as_plain_string() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
    }

    #[test]
    fn only_active_grants_access() {
        assert!(SubscriptionStatus::Active.has_access_now());
        assert!(!SubscriptionStatus::Trialing.has_access_now());
        assert!(!SubscriptionStatus::PastDue.has_access_now());
    }

    #[test]
    fn select_prefers_active_subscription() {
        let user = UserId::new("u1").unwrap();
        let subs = vec![
            sub("sub_a", "u1", "canceled"),
            sub("sub_b", "u2", "active"),
            sub("sub_c", "u1", "active"),
        ];

        let found = select_user_subscription(subs, &user).unwrap();
        assert_eq!(found.id, "sub_c");
    }

    #[test]
    fn select_falls_back_to_first_owned() {
        let user = UserId::new("u1").unwrap();
        let subs = vec![sub("sub_a", "u1", "canceled"), sub("sub_b", "u1", "past_due")];

        let found = select_user_subscription(subs, &user).unwrap();
        assert_eq!(found.id, "sub_a");
    }

    #[test]
    fn select_returns_none_for_stranger() {
        let user = UserId::new("u9").unwrap();
        assert!(select_user_subscription(vec![sub("sub_a", "u1", "active")], &user).is_none());
    }

    #[test]
    fn retryable_flag_follows_code() {
        assert!(PaymentError::network("reset").retryable);
        assert!(PaymentError::new(PaymentErrorCode::RateLimitExceeded, "slow down").retryable);
        assert!(!PaymentError::not_found("Subscription").retryable);
        assert!(!PaymentError::invalid_request("bad").retryable);
    }

    #[test]
    fn display_leads_with_code() {
        let err = PaymentError::invalid_request("Missing line items")
            .with_provider_code("parameter_missing");
        assert_eq!(err.to_string(), "invalid_request: Missing line items");
    }

    #[test]
    fn payment_error_converts_to_billing_error() {
        let err: BillingError = PaymentError::network("timed out")
            .with_provider_code("timeout")
            .into();
        assert_eq!(
            err,
            BillingError::payment_provider("timed out", Some("timeout".to_string()))
        );
    }
}
