//! Typed payment-provider events.
//!
//! Each event kind carries its own payload type, decoded once from the
//! envelope's raw `data.object`. A missing required field fails decoding
//! instead of surfacing later as an absent value.

use std::collections::HashMap;

use serde::Deserialize;

use super::stripe_event::{StripeEvent, StripeEventType};
use super::webhook_errors::WebhookError;

/// `checkout.session` object, as much of it as reconciliation reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// Requesting user: reference id first, metadata as fallback.
    pub fn user_id(&self) -> Option<&str> {
        self.client_reference_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| metadata_value(&self.metadata, "user_id"))
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        metadata_value(&self.metadata, key)
    }
}

/// `subscription` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SubscriptionObject {
    pub fn user_id(&self) -> Option<&str> {
        metadata_value(&self.metadata, "user_id")
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        metadata_value(&self.metadata, key)
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// `invoice` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Provider event, one variant per kind this service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    CheckoutCompleted(CheckoutSessionObject),
    SubscriptionCreated(SubscriptionObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    PaymentSucceeded(InvoiceObject),
    PaymentFailed(InvoiceObject),
    Unrecognized { event_type: String },
}

impl ProviderEvent {
    /// Decodes the envelope's object according to its event type.
    ///
    /// # Errors
    ///
    /// `MalformedPayload` if a known kind's object is missing required fields.
    pub fn from_stripe_event(event: &StripeEvent) -> Result<Self, WebhookError> {
        let kind = event.parsed_type();
        let parsed = match kind {
            StripeEventType::CheckoutSessionCompleted => {
                ProviderEvent::CheckoutCompleted(decode(event, kind)?)
            }
            StripeEventType::CustomerSubscriptionCreated => {
                ProviderEvent::SubscriptionCreated(decode(event, kind)?)
            }
            StripeEventType::CustomerSubscriptionUpdated => {
                ProviderEvent::SubscriptionUpdated(decode(event, kind)?)
            }
            StripeEventType::CustomerSubscriptionDeleted => {
                ProviderEvent::SubscriptionDeleted(decode(event, kind)?)
            }
            StripeEventType::InvoicePaymentSucceeded => {
                ProviderEvent::PaymentSucceeded(decode(event, kind)?)
            }
            StripeEventType::InvoicePaymentFailed => {
                ProviderEvent::PaymentFailed(decode(event, kind)?)
            }
            StripeEventType::Unknown => ProviderEvent::Unrecognized {
                event_type: event.event_type.clone(),
            },
        };
        Ok(parsed)
    }

    /// Event kind label for logs.
    pub fn kind(&self) -> &str {
        match self {
            ProviderEvent::CheckoutCompleted(_) => "checkout.session.completed",
            ProviderEvent::SubscriptionCreated(_) => "customer.subscription.created",
            ProviderEvent::SubscriptionUpdated(_) => "customer.subscription.updated",
            ProviderEvent::SubscriptionDeleted(_) => "customer.subscription.deleted",
            ProviderEvent::PaymentSucceeded(_) => "invoice.payment_succeeded",
            ProviderEvent::PaymentFailed(_) => "invoice.payment_failed",
            ProviderEvent::Unrecognized { event_type } => event_type,
        }
    }
}

/// A delivery that passed signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEvent {
    pub id: String,
    pub created: i64,
    pub livemode: bool,
    pub payload: ProviderEvent,
}

impl VerifiedEvent {
    pub fn from_stripe_event(event: &StripeEvent) -> Result<Self, WebhookError> {
        Ok(Self {
            id: event.id.clone(),
            created: event.created,
            livemode: event.livemode,
            payload: ProviderEvent::from_stripe_event(event)?,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    event: &StripeEvent,
    kind: StripeEventType,
) -> Result<T, WebhookError> {
    event
        .deserialize_object()
        .map_err(|e| WebhookError::MalformedPayload {
            kind: kind.as_str(),
            reason: e.to_string(),
        })
}

fn metadata_value<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}
