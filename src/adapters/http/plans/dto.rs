//! HTTP DTOs for the plan catalog endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingPeriod, Plan, PlanComparison, PriceQuote};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalculatePriceRequest {
    pub plan_id: String,
    pub is_yearly: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComparePlansRequest {
    pub plan_ids: Vec<String>,
    pub is_yearly: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One plan, with prices in major units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub monthly_price: f64,
    pub yearly_price: f64,
    pub perks: Vec<String>,
    pub is_active: bool,
    pub is_free: bool,
    pub is_enterprise: bool,
    pub yearly_discount: f64,
    pub yearly_discount_percentage: f64,
    pub formatted_monthly_price: String,
    pub formatted_yearly_price: String,
}

impl From<&Plan> for PlanResponse {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id.to_string(),
            name: plan.name.clone(),
            monthly_price: plan.price(BillingPeriod::Monthly),
            yearly_price: plan.price(BillingPeriod::Yearly),
            perks: plan.perks.clone(),
            is_active: plan.is_active,
            is_free: plan.is_free(),
            is_enterprise: plan.is_enterprise(),
            yearly_discount: plan.yearly_discount(),
            yearly_discount_percentage: plan.yearly_discount_percentage(),
            formatted_monthly_price: plan.formatted_price(BillingPeriod::Monthly),
            formatted_yearly_price: plan.formatted_price(BillingPeriod::Yearly),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanListResponse {
    pub success: bool,
    pub plans: Vec<PlanResponse>,
    pub count: usize,
}

impl PlanListResponse {
    pub fn from_plans(plans: Vec<&Plan>) -> Self {
        let plans: Vec<PlanResponse> = plans.into_iter().map(PlanResponse::from).collect();
        Self {
            success: true,
            count: plans.len(),
            plans,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDetailResponse {
    pub success: bool,
    pub plan: PlanResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceQuoteResponse {
    pub success: bool,
    pub plan_id: String,
    pub plan_name: String,
    pub is_yearly: bool,
    pub price: f64,
    pub formatted_price: String,
    pub discount: f64,
    pub discount_percentage: f64,
    /// `/month` or `/year`
    pub period: String,
}

impl From<PriceQuote> for PriceQuoteResponse {
    fn from(quote: PriceQuote) -> Self {
        Self {
            success: true,
            plan_id: quote.plan_id.to_string(),
            plan_name: quote.plan_name,
            is_yearly: quote.period.is_yearly(),
            price: quote.price,
            formatted_price: quote.formatted_price,
            discount: quote.discount,
            discount_percentage: quote.discount_percentage,
            period: quote.suffix.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntryResponse {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub formatted_price: String,
    pub perks: Vec<String>,
    pub perks_count: usize,
    pub is_free: bool,
    pub is_enterprise: bool,
}

impl From<PlanComparison> for ComparisonEntryResponse {
    fn from(c: PlanComparison) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            price: c.price,
            formatted_price: c.formatted_price,
            perks: c.perks,
            perks_count: c.perks_count,
            is_free: c.is_free,
            is_enterprise: c.is_enterprise,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparePlansResponse {
    pub success: bool,
    pub plans: Vec<ComparisonEntryResponse>,
    /// `monthly` or `yearly`
    pub billing_period: String,
}
