//! Checkout request validation and provider session shaping.
//!
//! Pure functions: given a client request, the requester and the catalog,
//! produce the exact session the payment provider should create, or the
//! full list of offending fields.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::domain::foundation::{AuthenticatedUser, FieldError, UserId};

use super::{BillingPeriod, PlanCatalog};

/// Placeholder Stripe substitutes with the session id on redirect.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Metadata keys owned by this service; client-supplied values are overwritten.
pub const RESERVED_METADATA_KEYS: [&str; 4] = ["user_id", "plan_id", "plan_name", "billing_period"];

/// Where the billed amount comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// Bill the catalog price; the client amount is only cross-checked.
    #[default]
    Catalog,
    /// Bill whatever amount the client sent (plan must still exist).
    ClientAmount,
}

/// Client plan selection, as received.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub amount: f64,
    pub currency: String,
    pub plan_id: String,
    pub plan_name: String,
    pub is_yearly: bool,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

/// Single recurring line item with inline price data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Lowercase ISO currency code.
    pub currency: String,
    pub product_name: String,
    pub description: String,
    /// Price in minor units.
    pub unit_amount: i64,
    pub interval: &'static str,
    pub quantity: u32,
}

/// Everything the provider needs to open a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub line_item: LineItem,
    pub success_url: String,
    pub cancel_url: String,
    pub client_reference_id: UserId,
    pub customer_email: String,
    /// Ordered so that encoded requests are deterministic.
    pub metadata: BTreeMap<String, String>,
}

/// Converts a major-unit amount to integer minor units, rounding half away from zero.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Validates the request and builds the provider session.
///
/// # Errors
///
/// Every offending field, not just the first.
pub fn build_session_request(
    request: &CheckoutRequest,
    requester: &AuthenticatedUser,
    catalog: &PlanCatalog,
    policy: PricingPolicy,
) -> Result<CheckoutSessionRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    if !request.amount.is_finite() || request.amount <= 0.0 {
        errors.push(FieldError::new("amount", "must be greater than 0"));
    }
    if request.currency.len() != 3 || !request.currency.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.push(FieldError::new("currency", "must be a 3-letter currency code"));
    }
    if request.plan_name.trim().is_empty() {
        errors.push(FieldError::new("plan_name", "is required"));
    }
    for (field, url) in [
        ("success_url", &request.success_url),
        ("cancel_url", &request.cancel_url),
    ] {
        if !is_absolute_http_url(url) {
            errors.push(FieldError::new(field, "must be an absolute http(s) URL"));
        }
    }

    let period = BillingPeriod::from_yearly_flag(request.is_yearly);
    let plan = if request.plan_id.trim().is_empty() {
        errors.push(FieldError::new("plan_id", "is required"));
        None
    } else {
        let plan = catalog.get(&request.plan_id).filter(|p| p.is_active);
        if plan.is_none() {
            errors.push(FieldError::new("plan_id", "does not match an active plan"));
        }
        plan
    };

    let unit_amount = match (plan, policy) {
        (Some(plan), PricingPolicy::Catalog) => {
            let catalog_amount = plan.price_cents(period);
            if catalog_amount <= 0 {
                errors.push(FieldError::new("amount", "plan has no billable price"));
            } else if request.amount.is_finite() && to_minor_units(request.amount) != catalog_amount {
                tracing::warn!(
                    user_id = %requester.id,
                    plan_id = %plan.id,
                    client_amount = request.amount,
                    catalog_amount_minor = catalog_amount,
                    "Client checkout amount differs from catalog price; billing catalog price"
                );
            }
            catalog_amount
        }
        _ => to_minor_units(request.amount),
    };

    if !errors.is_empty() {
        return Err(errors);
    }
    let Some(plan) = plan else {
        return Err(vec![FieldError::new("plan_id", "does not match an active plan")]);
    };

    if plan.name != request.plan_name {
        tracing::debug!(
            plan_id = %plan.id,
            client_plan_name = %request.plan_name,
            catalog_plan_name = %plan.name,
            "Client plan name differs from catalog"
        );
    }

    let mut metadata: BTreeMap<String, String> = request
        .metadata
        .iter()
        .filter(|(k, _)| !RESERVED_METADATA_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    metadata.insert("user_id".to_string(), requester.id.to_string());
    metadata.insert("plan_id".to_string(), plan.id.to_string());
    metadata.insert("plan_name".to_string(), plan.name.clone());
    metadata.insert("billing_period".to_string(), period.tag().to_string());

    Ok(CheckoutSessionRequest {
        line_item: LineItem {
            currency: request.currency.to_lowercase(),
            product_name: plan.name.clone(),
            description: format!("Hydro AI - {} Plan", plan.name),
            unit_amount,
            interval: period.interval(),
            quantity: 1,
        },
        success_url: with_session_placeholder(&request.success_url),
        cancel_url: request.cancel_url.clone(),
        client_reference_id: requester.id.clone(),
        customer_email: requester.email_or_fallback().to_string(),
        metadata,
    })
}

/// Appends the session-id query parameter to the success URL.
fn with_session_placeholder(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}session_id={}", url, separator, SESSION_ID_PLACEHOLDER)
}

fn is_absolute_http_url(url: &str) -> bool {
    if url.chars().any(char::is_whitespace) {
        return false;
    }
    match reqwest::Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
