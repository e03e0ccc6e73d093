//! Billing period selection.

use serde::{Deserialize, Serialize};

/// Recurrence chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    /// Maps the client's `is_yearly` flag.
    pub fn from_yearly_flag(is_yearly: bool) -> Self {
        if is_yearly {
            BillingPeriod::Yearly
        } else {
            BillingPeriod::Monthly
        }
    }

    /// Parses the `billing_period` metadata tag written at checkout.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "monthly" => Some(BillingPeriod::Monthly),
            "yearly" => Some(BillingPeriod::Yearly),
            _ => None,
        }
    }

    pub fn is_yearly(&self) -> bool {
        matches!(self, BillingPeriod::Yearly)
    }

    /// Metadata tag stored on the checkout session.
    pub fn tag(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
        }
    }

    /// Stripe `recurring[interval]` value.
    pub fn interval(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "month",
            BillingPeriod::Yearly => "year",
        }
    }

    /// Suffix shown after a price.
    pub fn suffix(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "/month",
            BillingPeriod::Yearly => "/year",
        }
    }

    /// Length of one cycle, used for locally computed period ends.
    pub fn months(&self) -> u32 {
        match self {
            BillingPeriod::Monthly => 1,
            BillingPeriod::Yearly => 12,
        }
    }
}
