//! Stripe webhook envelope.
//!
//! Only the envelope is parsed here; the `data.object` payload stays as raw
//! JSON until [`ProviderEvent`](super::ProviderEvent) decodes it by kind.

use serde::{Deserialize, Serialize};

/// `{id, type, created, livemode, data: {object}}`; other envelope keys are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix seconds. Reconciliation timestamps derive from this, not the wall clock.
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// Raw object; its shape depends on the event type.
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Decodes `data.object` as `T`.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data.object)
    }

    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }
}

/// Event types reconciliation dispatches on. Everything else is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    CustomerSubscriptionCreated,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    Unknown,
}

const KNOWN_EVENT_TYPES: [(&str, StripeEventType); 6] = [
    ("checkout.session.completed", StripeEventType::CheckoutSessionCompleted),
    ("customer.subscription.created", StripeEventType::CustomerSubscriptionCreated),
    ("customer.subscription.updated", StripeEventType::CustomerSubscriptionUpdated),
    ("customer.subscription.deleted", StripeEventType::CustomerSubscriptionDeleted),
    ("invoice.payment_succeeded", StripeEventType::InvoicePaymentSucceeded),
    ("invoice.payment_failed", StripeEventType::InvoicePaymentFailed),
];

impl StripeEventType {
    pub fn parse(s: &str) -> Self {
        KNOWN_EVENT_TYPES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        KNOWN_EVENT_TYPES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

/// Test envelopes; `created` defaults to now so signed payloads are fresh.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }

    /// Serialized JSON body, as Stripe would send it.
    pub fn to_payload(self) -> String {
        serde_json::to_string(&self.build()).expect("serializable event")
    }
}
