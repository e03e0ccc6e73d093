//! Billing configuration: pricing policy and external plan ids

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::billing::catalog::seed_plan_keys;
use crate::domain::billing::PricingPolicy;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub pricing_policy: PricingPolicy,

    /// Profile-store plan record ids keyed `free`, `individual`, `company`, `utilities`.
    #[serde(default)]
    pub plan_ids: HashMap<String, String>,
}

impl BillingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for key in seed_plan_keys() {
            let present = self
                .plan_ids
                .get(key)
                .map(|id| !id.trim().is_empty())
                .unwrap_or(false);
            if !present {
                return Err(ValidationError::MissingPlanId(key.to_string()));
            }
        }
        Ok(())
    }
}
