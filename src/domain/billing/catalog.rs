//! Read-only plan catalog.
//!
//! Built once at startup and shared behind an `Arc`. The catalog is the single
//! source of the plan name to external identifier mapping; reconciliation never
//! resolves a plan any other way before falling back to the profile store.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::domain::foundation::PlanId;

use super::{BillingPeriod, Plan};

/// Smallest number of plans a comparison accepts.
pub const MIN_COMPARE: usize = 2;

/// Largest number of plans a comparison accepts.
pub const MAX_COMPARE: usize = 4;

/// A plan as seeded at startup, before its external id is known.
struct SeedPlan {
    key: &'static str,
    name: &'static str,
    monthly_cents: i64,
    yearly_cents: i64,
    perks: &'static [&'static str],
}

const SEED_PLANS: [SeedPlan; 4] = [
    SeedPlan {
        key: "free",
        name: "Free",
        monthly_cents: 0,
        yearly_cents: 0,
        perks: &[
            "Full access for 7 days",
            "Ask any AI questions",
            "Read hydro images (basic interpretation)",
        ],
    },
    SeedPlan {
        key: "individual",
        name: "Individual",
        monthly_cents: 1999,
        yearly_cents: 9900,
        perks: &[
            "All features of Individual plan",
            "Read & interpret images (basic hydro components)",
            "Insights on hydropower standards, failures, case studies worldwide",
            "Personal learning companion",
        ],
    },
    SeedPlan {
        key: "company",
        name: "Company",
        monthly_cents: 4999,
        yearly_cents: 29900,
        perks: &[
            "All features of Company plan",
            "Advanced analytics for organizations",
            "Shared knowledge base across teams",
            "Unlimited Q&A",
            "Multi-user management",
        ],
    },
    SeedPlan {
        key: "utilities",
        name: "Hydropower Utilities",
        monthly_cents: 60000,
        yearly_cents: 500000,
        perks: &[
            "All features of Company plan",
            "Seamless integration with ERP/Asset Management systems",
            "Tailored to hydropower asset O&M (Operation & Maintenance)",
            "Included support under TGM Expert contract",
        ],
    },
];

/// Keys under which seeded plans expect their external ids.
pub fn seed_plan_keys() -> impl Iterator<Item = &'static str> {
    SEED_PLANS.iter().map(|s| s.key)
}

/// Errors from building or querying the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("No external plan id configured for '{0}'")]
    MissingExternalId(String),

    #[error("Duplicate plan in catalog: {0}")]
    DuplicatePlan(String),

    #[error("Catalog has no active free plan")]
    NoFreePlan,

    #[error("Comparison needs between 2 and 4 plans, got {0}")]
    ComparisonSize(usize),

    #[error("Plan not found: {0}")]
    PlanNotFound(String),
}

/// Price of a plan for one billing period.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub plan_id: PlanId,
    pub plan_name: String,
    pub period: BillingPeriod,
    pub price: f64,
    pub formatted_price: String,
    /// Yearly savings; zero for monthly quotes.
    pub discount: f64,
    pub discount_percentage: f64,
    pub suffix: &'static str,
}

/// One column of a plan comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanComparison {
    pub id: PlanId,
    pub name: String,
    pub price: f64,
    pub formatted_price: String,
    pub perks: Vec<String>,
    pub perks_count: usize,
    pub is_free: bool,
    pub is_enterprise: bool,
}

/// The set of plans on offer.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
    free_index: usize,
}

impl PlanCatalog {
    /// Builds a catalog from explicit plans.
    ///
    /// # Errors
    ///
    /// - `DuplicatePlan` if two plans share a name or id
    /// - `NoFreePlan` if no active plan is free
    pub fn new(plans: Vec<Plan>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for plan in &plans {
            if !names.insert(plan.name.clone()) {
                return Err(CatalogError::DuplicatePlan(plan.name.clone()));
            }
            if !ids.insert(plan.id.clone()) {
                return Err(CatalogError::DuplicatePlan(plan.id.to_string()));
            }
        }

        let free_index = plans
            .iter()
            .position(|p| p.is_active && p.is_free())
            .ok_or(CatalogError::NoFreePlan)?;

        Ok(Self { plans, free_index })
    }

    /// Builds the standard catalog, taking external ids keyed by plan key
    /// (`free`, `individual`, `company`, `utilities`).
    ///
    /// # Errors
    ///
    /// `MissingExternalId` if any seeded plan has no usable id.
    pub fn seeded(external_ids: &HashMap<String, String>) -> Result<Self, CatalogError> {
        let plans = SEED_PLANS
            .iter()
            .map(|seed| {
                let id = external_ids
                    .get(seed.key)
                    .and_then(|raw| PlanId::new(raw.clone()).ok())
                    .ok_or_else(|| CatalogError::MissingExternalId(seed.key.to_string()))?;
                Ok(Plan::new(
                    id,
                    seed.name,
                    seed.monthly_cents,
                    seed.yearly_cents,
                    seed.perks.iter().map(|p| p.to_string()).collect(),
                ))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Self::new(plans)
    }

    /// Exact, case-sensitive lookup by name.
    pub fn lookup(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }

    /// Lookup by external identifier.
    pub fn get(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id.as_str() == id)
    }

    /// Case-insensitive substring search over active plans, cheapest first.
    pub fn find_by_name(&self, fragment: &str) -> Vec<&Plan> {
        let needle = fragment.to_lowercase();
        let mut found: Vec<&Plan> = self
            .plans
            .iter()
            .filter(|p| p.is_active && p.name.to_lowercase().contains(&needle))
            .collect();
        found.sort_by_key(|p| p.monthly_price_cents);
        found
    }

    /// Active plans sorted by monthly price ascending.
    pub fn list_active(&self) -> Vec<&Plan> {
        let mut active: Vec<&Plan> = self.plans.iter().filter(|p| p.is_active).collect();
        active.sort_by_key(|p| p.monthly_price_cents);
        active
    }

    /// External identifier for an exact plan name.
    pub fn external_id_for(&self, name: &str) -> Option<&PlanId> {
        self.lookup(name).map(|p| &p.id)
    }

    /// The plan users are downgraded to.
    pub fn free_plan(&self) -> &Plan {
        &self.plans[self.free_index]
    }

    /// Price of a plan for the given period.
    pub fn calculate_price(&self, id: &str, period: BillingPeriod) -> Option<PriceQuote> {
        let plan = self.get(id)?;
        let (discount, discount_percentage) = if period.is_yearly() {
            (plan.yearly_discount(), plan.yearly_discount_percentage())
        } else {
            (0.0, 0.0)
        };

        Some(PriceQuote {
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            period,
            price: plan.price(period),
            formatted_price: plan.formatted_price(period),
            discount,
            discount_percentage,
            suffix: period.suffix(),
        })
    }

    /// Side-by-side view of 2 to 4 plans, in the order requested.
    pub fn compare(
        &self,
        ids: &[String],
        period: BillingPeriod,
    ) -> Result<Vec<PlanComparison>, CatalogError> {
        if !(MIN_COMPARE..=MAX_COMPARE).contains(&ids.len()) {
            return Err(CatalogError::ComparisonSize(ids.len()));
        }

        ids.iter()
            .map(|id| {
                let plan = self
                    .get(id)
                    .ok_or_else(|| CatalogError::PlanNotFound(id.clone()))?;
                Ok(PlanComparison {
                    id: plan.id.clone(),
                    name: plan.name.clone(),
                    price: plan.price(period),
                    formatted_price: plan.formatted_price(period),
                    perks: plan.perks.clone(),
                    perks_count: plan.perks.len(),
                    is_free: plan.is_free(),
                    is_enterprise: plan.is_enterprise(),
                })
            })
            .collect()
    }
}

/// Catalog with predictable ids, for tests across the crate.
#[cfg(test)]
pub fn test_catalog() -> PlanCatalog {
    let ids: HashMap<String, String> = seed_plan_keys()
        .map(|k| (k.to_string(), format!("pb_{}", k)))
        .collect();
    PlanCatalog::seeded(&ids).expect("seeded catalog")
}
