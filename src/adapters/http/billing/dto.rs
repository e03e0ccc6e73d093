//! HTTP DTOs for the billing endpoints.
//!
//! Field names follow the JSON contract the frontend already speaks,
//! including the one camelCase key (`sessionId`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{
    CancelSubscriptionResult, CheckoutSessionCreated, CheckoutSessionVerified,
    SubscriptionStatusResult, SyncSubscriptionResult,
};
use crate::domain::billing::CheckoutRequest;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /stripe/create-checkout`.
///
/// Absent fields default to empty values so that validation can report every
/// missing field at once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateCheckoutRequest {
    pub amount: f64,
    pub currency: String,
    pub plan_id: String,
    pub plan_name: String,
    pub is_yearly: bool,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

impl CreateCheckoutRequest {
    pub const FIELDS: [&'static str; 8] = [
        "amount",
        "currency",
        "plan_id",
        "plan_name",
        "is_yearly",
        "success_url",
        "cancel_url",
        "metadata",
    ];
}

impl From<CreateCheckoutRequest> for CheckoutRequest {
    fn from(req: CreateCheckoutRequest) -> Self {
        CheckoutRequest {
            amount: req.amount,
            currency: req.currency,
            plan_id: req.plan_id,
            plan_name: req.plan_name,
            is_yearly: req.is_yearly,
            success_url: req.success_url,
            cancel_url: req.cancel_url,
            metadata: req.metadata,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CreateCheckoutResponse {
    pub success: bool,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub url: String,
}

impl From<CheckoutSessionCreated> for CreateCheckoutResponse {
    fn from(created: CheckoutSessionCreated) -> Self {
        Self {
            success: true,
            session_id: created.session_id,
            url: created.url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifySessionResponse {
    pub success: bool,
    pub status: Option<String>,
    pub customer_email: Option<String>,
    /// Major units.
    pub amount_total: Option<f64>,
    pub currency: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl From<CheckoutSessionVerified> for VerifySessionResponse {
    fn from(verified: CheckoutSessionVerified) -> Self {
        Self {
            success: true,
            status: verified.status,
            customer_email: verified.customer_email,
            amount_total: verified.amount_total,
            currency: verified.currency,
            metadata: verified.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusResponse {
    pub success: bool,
    pub has_subscription: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_at_period_end: Option<bool>,
}

impl From<SubscriptionStatusResult> for SubscriptionStatusResponse {
    fn from(result: SubscriptionStatusResult) -> Self {
        match result {
            SubscriptionStatusResult::None => Self {
                success: true,
                has_subscription: false,
                message: Some("No active subscription".to_string()),
                subscription_id: None,
                status: None,
                plan_name: None,
                current_period_end: None,
                cancel_at_period_end: None,
            },
            SubscriptionStatusResult::Found {
                subscription_id,
                status,
                plan_name,
                current_period_end,
                cancel_at_period_end,
            } => Self {
                success: true,
                has_subscription: true,
                message: None,
                subscription_id: Some(subscription_id),
                status: Some(status),
                plan_name: Some(plan_name),
                current_period_end,
                cancel_at_period_end: Some(cancel_at_period_end),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelSubscriptionResponse {
    pub success: bool,
    pub message: String,
    pub subscription_id: String,
    pub effective_date: Option<String>,
}

impl From<CancelSubscriptionResult> for CancelSubscriptionResponse {
    fn from(result: CancelSubscriptionResult) -> Self {
        Self {
            success: true,
            message: result.message(),
            subscription_id: result.subscription_id,
            effective_date: result.effective_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSubscriptionResponse {
    pub success: bool,
    pub synced: bool,
    pub status: String,
    pub plan_id: String,
}

impl From<SyncSubscriptionResult> for SyncSubscriptionResponse {
    fn from(result: SyncSubscriptionResult) -> Self {
        Self {
            success: true,
            synced: true,
            status: result.status,
            plan_id: result.plan_id.to_string(),
        }
    }
}

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookReceivedResponse {
    pub received: bool,
}

/// Body of a rejected delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookErrorResponse {
    pub error: String,
}
