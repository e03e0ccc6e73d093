//! Subscription plan value object.
//!
//! Prices are held as integer cents so that discount arithmetic is exact;
//! conversion to major units happens only at the presentation edge.

use serde::Serialize;

use crate::domain::foundation::PlanId;

use super::BillingPeriod;

/// Substrings (lowercase) that mark a plan as enterprise-priced.
const ENTERPRISE_MARKERS: [&str; 3] = ["utility", "utilities", "enterprise"];

/// A plan offered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// External identifier (plan record id in the profile store).
    pub id: PlanId,
    pub name: String,
    pub monthly_price_cents: i64,
    pub yearly_price_cents: i64,
    pub perks: Vec<String>,
    pub is_active: bool,
}

impl Plan {
    pub fn new(
        id: PlanId,
        name: impl Into<String>,
        monthly_price_cents: i64,
        yearly_price_cents: i64,
        perks: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            monthly_price_cents,
            yearly_price_cents,
            perks,
            is_active: true,
        }
    }

    /// Marks the plan as withdrawn from sale.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// True when both prices are zero.
    pub fn is_free(&self) -> bool {
        self.monthly_price_cents == 0 && self.yearly_price_cents == 0
    }

    /// True when the name marks the plan as custom-quoted.
    pub fn is_enterprise(&self) -> bool {
        let name = self.name.to_lowercase();
        ENTERPRISE_MARKERS.iter().any(|m| name.contains(m))
    }

    /// Price for one cycle of the given period, in cents.
    pub fn price_cents(&self, period: BillingPeriod) -> i64 {
        match period {
            BillingPeriod::Monthly => self.monthly_price_cents,
            BillingPeriod::Yearly => self.yearly_price_cents,
        }
    }

    /// Price for one cycle in major units.
    pub fn price(&self, period: BillingPeriod) -> f64 {
        cents_to_major(self.price_cents(period))
    }

    /// Savings of paying yearly over twelve monthly payments, in cents.
    ///
    /// Zero whenever either price is zero.
    pub fn yearly_discount_cents(&self) -> i64 {
        if self.monthly_price_cents == 0 || self.yearly_price_cents == 0 {
            return 0;
        }
        self.monthly_price_cents * 12 - self.yearly_price_cents
    }

    pub fn yearly_discount(&self) -> f64 {
        cents_to_major(self.yearly_discount_cents())
    }

    /// Yearly savings as a percentage of twelve monthly payments, two decimals.
    pub fn yearly_discount_percentage(&self) -> f64 {
        if self.monthly_price_cents == 0 || self.yearly_price_cents == 0 {
            return 0.0;
        }
        let monthly_cost = (self.monthly_price_cents * 12) as f64;
        round2(self.yearly_discount_cents() as f64 / monthly_cost * 100.0)
    }

    /// Display price: `$0` for free plans, `Custom` for enterprise, else whole dollars.
    pub fn formatted_price(&self, period: BillingPeriod) -> String {
        if self.is_free() {
            return "$0".to_string();
        }
        if self.is_enterprise() {
            return "Custom".to_string();
        }
        format!("${}", format_whole_units(self.price_cents(period)))
    }
}

/// Converts cents to major currency units.
pub fn cents_to_major(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds cents half-up to whole units and groups thousands with commas.
fn format_whole_units(cents: i64) -> String {
    let negative = cents < 0;
    let whole = (cents.abs() + 50) / 100;
    let digits = whole.to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plan(name: &str, monthly: i64, yearly: i64) -> Plan {
        Plan::new(
            PlanId::new(format!("id_{}", name.to_lowercase().replace(' ', "_"))).unwrap(),
            name,
            monthly,
            yearly,
            vec!["perk one".to_string(), "perk two".to_string()],
        )
    }

    // ══════════════════════════════════════════════════════════════
    // Derived Flags
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn zero_prices_mean_free() {
        let free = plan("Free", 0, 0);
        assert!(free.is_free());
        assert!(!plan("Individual", 1999, 9900).is_free());
        assert!(!plan("Odd", 0, 9900).is_free());
    }

    #[test]
    fn enterprise_markers_are_case_insensitive() {
        assert!(plan("Hydropower Utilities", 60000, 500000).is_enterprise());
        assert!(plan("UTILITY Grid", 100, 1000).is_enterprise());
        assert!(plan("Acme Enterprise", 100, 1000).is_enterprise());
        assert!(!plan("Company", 4999, 29900).is_enterprise());
    }

    // ══════════════════════════════════════════════════════════════
    // Discounts
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn individual_plan_discount() {
        let p = plan("Individual", 1999, 9900);
        assert_eq!(p.yearly_discount_cents(), 14088);
        assert!((p.yearly_discount() - 140.88).abs() < 1e-9);
        assert!((p.yearly_discount_percentage() - 58.73).abs() < 1e-9);
    }

    #[test]
    fn discount_is_zero_when_either_price_is_zero() {
        assert_eq!(plan("Free", 0, 0).yearly_discount_cents(), 0);
        assert_eq!(plan("Monthly only", 1000, 0).yearly_discount_cents(), 0);
        assert_eq!(plan("Monthly only", 1000, 0).yearly_discount_percentage(), 0.0);
        assert_eq!(plan("Yearly only", 0, 1000).yearly_discount_percentage(), 0.0);
    }

    // ══════════════════════════════════════════════════════════════
    // Formatting
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn formatted_price_rounds_to_whole_dollars() {
        let p = plan("Individual", 1999, 9900);
        assert_eq!(p.formatted_price(BillingPeriod::Monthly), "$20");
        assert_eq!(p.formatted_price(BillingPeriod::Yearly), "$99");
    }

    #[test]
    fn formatted_price_groups_thousands() {
        let p = plan("Big", 120000, 1250000);
        assert_eq!(p.formatted_price(BillingPeriod::Monthly), "$1,200");
        assert_eq!(p.formatted_price(BillingPeriod::Yearly), "$12,500");
    }

    #[test]
    fn free_plan_formats_as_zero_dollars() {
        let p = plan("Free", 0, 0);
        assert_eq!(p.formatted_price(BillingPeriod::Monthly), "$0");
        assert_eq!(p.formatted_price(BillingPeriod::Yearly), "$0");
    }

    #[test]
    fn enterprise_plan_formats_as_custom() {
        let p = plan("Hydropower Utilities", 60000, 500000);
        assert_eq!(p.formatted_price(BillingPeriod::Monthly), "Custom");
        assert_eq!(p.formatted_price(BillingPeriod::Yearly), "Custom");
    }

    proptest! {
        #[test]
        fn free_plans_always_format_as_zero(name in "[A-Za-z ]{1,30}", yearly in any::<bool>()) {
            let p = plan(&name, 0, 0);
            prop_assert!(p.is_free());
            prop_assert_eq!(p.formatted_price(BillingPeriod::from_yearly_flag(yearly)), "$0");
        }

        #[test]
        fn enterprise_names_always_format_as_custom(
            prefix in "[a-z ]{0,10}",
            marker in prop::sample::select(vec!["Utility", "UTILITIES", "enterprise", "Enterprise"]),
            monthly in 1i64..1_000_000,
            yearly in 1i64..10_000_000,
        ) {
            let p = plan(&format!("{}{}", prefix, marker), monthly, yearly);
            prop_assert!(p.is_enterprise());
            prop_assert_eq!(p.formatted_price(BillingPeriod::Monthly), "Custom");
        }

        #[test]
        fn discount_matches_twelve_months_minus_yearly(monthly in 1i64..100_000, yearly in 1i64..1_000_000) {
            let p = plan("Paid", monthly, yearly);
            prop_assert_eq!(p.yearly_discount_cents(), monthly * 12 - yearly);
        }
    }
}
