//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait over the Stripe REST API:
//! form-encoded requests, basic auth with the secret key, JSON responses.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret);
//! let adapter = StripePaymentAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::billing::{
    CheckoutSessionRequest, StripeWebhookVerifier, VerifiedEvent, WebhookError,
};
use crate::ports::{
    CheckoutSession, CheckoutSessionDetails, PaymentError, PaymentProvider, Subscription,
};

use super::api_types::{error_from_response, StripeCheckoutSession, StripeList, StripeSubscription};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Whether to reject test-mode webhook events.
    require_livemode: bool,

    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            api_key,
            webhook_secret,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            require_livemode: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Require livemode events in production.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    verifier: StripeWebhookVerifier,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;
        let verifier = StripeWebhookVerifier::new(config.webhook_secret.clone())
            .with_require_livemode(config.require_livemode);

        Ok(Self {
            config,
            verifier,
            http_client,
        })
    }

    /// `{base}/v1/{segments...}`, each segment escaped on its own.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, PaymentError> {
        let invalid = || {
            PaymentError::invalid_request(format!(
                "Bad Stripe base URL: {}",
                self.config.api_base_url
            ))
        };
        let mut url = reqwest::Url::parse(&self.config.api_base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and decodes a successful JSON body.
    ///
    /// Returns `Ok(None)` on 404 so lookups can report absence.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<Option<T>, PaymentError> {
        let response = request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = error_from_response(status.as_u16(), &error_text);
            tracing::error!(
                operation,
                status = status.as_u16(),
                provider_code = ?err.provider_code,
                error = %err.message,
                "Stripe request failed"
            );
            return Err(err);
        }

        let body = response.json::<T>().await.map_err(|e| {
            PaymentError::decode(format!("Failed to parse Stripe response: {}", e))
        })?;
        Ok(Some(body))
    }

    /// Like [`Self::execute`], but a 404 is an error.
    async fn execute_required<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
        resource: &str,
    ) -> Result<T, PaymentError> {
        self.execute(request, operation)
            .await?
            .ok_or_else(|| PaymentError::not_found(resource))
    }
}

/// Form fields for `POST /v1/checkout/sessions`.
pub fn checkout_form_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let item = &request.line_item;
    let mut params = vec![
        ("payment_method_types[0]".to_string(), "card".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            item.currency.clone(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            item.product_name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]".to_string(),
            item.description.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            item.unit_amount.to_string(),
        ),
        (
            "line_items[0][price_data][recurring][interval]".to_string(),
            item.interval.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), item.quantity.to_string()),
        ("mode".to_string(), "subscription".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "client_reference_id".to_string(),
            request.client_reference_id.to_string(),
        ),
        ("customer_email".to_string(), request.customer_email.clone()),
    ];

    for (key, value) in &request.metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }

    params
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = checkout_form_params(request);

        let session: StripeCheckoutSession = self
            .execute_required(
                self.http_client
                    .post(self.url(&["checkout", "sessions"])?)
                    .form(&params),
                "create_checkout_session",
                "Checkout endpoint",
            )
            .await?;

        tracing::info!(
            session_id = %session.id,
            user_id = %request.client_reference_id,
            "Checkout session created"
        );

        session.into_checkout_session()
    }

    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, PaymentError> {
        let session: Option<StripeCheckoutSession> = self
            .execute(
                self.http_client
                    .get(self.url(&["checkout", "sessions", session_id])?),
                "get_checkout_session",
            )
            .await?;

        Ok(session.map(CheckoutSessionDetails::from))
    }

    async fn list_subscriptions(&self, limit: u8) -> Result<Vec<Subscription>, PaymentError> {
        let list: StripeList<StripeSubscription> = self
            .execute_required(
                self.http_client
                    .get(self.url(&["subscriptions"])?)
                    .query(&[("limit", limit.to_string()), ("status", "all".to_string())]),
                "list_subscriptions",
                "Subscription list",
            )
            .await?;

        Ok(list.data.into_iter().map(Subscription::from).collect())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, PaymentError> {
        let sub: Option<StripeSubscription> = self
            .execute(
                self.http_client
                    .get(self.url(&["subscriptions", subscription_id])?),
                "get_subscription",
            )
            .await?;

        Ok(sub.map(Subscription::from))
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<Subscription, PaymentError> {
        let url = self.url(&["subscriptions", subscription_id])?;

        let request = if at_period_end {
            // Update subscription to cancel at period end
            self.http_client
                .post(url)
                .form(&[("cancel_at_period_end", "true")])
        } else {
            // Immediately cancel
            self.http_client.delete(url)
        };

        let sub: StripeSubscription = self
            .execute_required(request, "cancel_subscription", "Subscription")
            .await?;

        tracing::info!(
            subscription_id = %sub.id,
            at_period_end,
            "Subscription cancellation requested"
        );

        Ok(sub.into())
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VerifiedEvent, WebhookError> {
        self.verifier.verify(payload, signature)
    }
}
