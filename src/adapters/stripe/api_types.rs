//! Stripe REST objects as returned by the API.
//!
//! Only the fields this service reads are modelled; everything else in the
//! response is ignored. Conversions into port types live here so the adapter
//! itself stays focused on transport.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ports::{
    CheckoutSession, CheckoutSessionDetails, PaymentError, PaymentErrorCode, Subscription,
    SubscriptionStatus,
};

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Object Types
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Hosted checkout page. Absent once the session is complete.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub customer: Option<String>,

    /// Email passed in when the session was created.
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Details collected on the checkout page.
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,

    #[serde(default)]
    pub subscription: Option<String>,

    /// Session payment status (paid, unpaid, no_payment_required).
    #[serde(default)]
    pub payment_status: Option<String>,

    /// Total in minor units.
    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl StripeCheckoutSession {
    /// The created session as handed back to the browser.
    pub fn into_checkout_session(self) -> Result<CheckoutSession, PaymentError> {
        let url = self.url.ok_or_else(|| {
            PaymentError::decode(format!("Checkout session {} has no url", self.id))
        })?;
        Ok(CheckoutSession { id: self.id, url })
    }

    /// Customer email, preferring what was entered on the checkout page.
    pub fn email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
    }
}

impl From<StripeCheckoutSession> for CheckoutSessionDetails {
    fn from(session: StripeCheckoutSession) -> Self {
        let customer_email = session.email().map(str::to_string);
        CheckoutSessionDetails {
            id: session.id,
            payment_status: session.payment_status,
            customer_email,
            amount_total: session.amount_total,
            currency: session.currency,
            metadata: session.metadata,
        }
    }
}

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer ID owning this subscription.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription status.
    pub status: String,

    /// Current period end (Unix timestamp).
    #[serde(default)]
    pub current_period_end: Option<i64>,

    /// Whether subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// Custom metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl From<StripeSubscription> for Subscription {
    fn from(sub: StripeSubscription) -> Self {
        Subscription {
            id: sub.id,
            customer_id: sub.customer,
            status: SubscriptionStatus::parse(&sub.status),
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
            metadata: sub.metadata,
        }
    }
}

/// Paginated list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Responses
// ════════════════════════════════════════════════════════════════════════════════

/// `{"error": {...}}` body of a failed API call.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
}

/// Map a non-success response into a [`PaymentError`].
///
/// The provider's `error.code` (or `error.type`) is kept as `provider_code`.
pub fn error_from_response(status: u16, body: &str) -> PaymentError {
    let code = match status {
        401 | 403 => PaymentErrorCode::AuthenticationError,
        404 => PaymentErrorCode::NotFound,
        429 => PaymentErrorCode::RateLimitExceeded,
        400..=499 => PaymentErrorCode::InvalidRequest,
        _ => PaymentErrorCode::ProviderError,
    };

    match serde_json::from_str::<StripeErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let err = PaymentError::new(code, message);
            match envelope.error.code.or(envelope.error.error_type) {
                Some(provider_code) => err.with_provider_code(provider_code),
                None => err,
            }
        }
        Err(_) => PaymentError::new(code, format!("Stripe API error ({}): {}", status, body)),
    }
}
