//! Subscription state as pushed to the profile store.
//!
//! Every field in a [`ProfilePatch`] is an absolute assignment, and all
//! timestamps derive from the triggering event rather than the wall clock,
//! so applying the same event twice yields byte-identical patches.

use serde::Serialize;

use crate::domain::foundation::{PlanId, Timestamp, UserId};

use super::BillingPeriod;

/// Subscription status written to the user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Active,
    Cancelled,
    /// Provider status copied verbatim (e.g. `past_due`, `trialing`).
    Provider(String),
}

impl SyncStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SyncStatus::Active => "active",
            SyncStatus::Cancelled => "cancelled",
            SyncStatus::Provider(s) => s,
        }
    }
}

/// Outcome of reconciling one provider object for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSyncResult {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: SyncStatus,
    pub period_end: Timestamp,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub last_payment_at: Option<Timestamp>,
}

impl SubscriptionSyncResult {
    /// Upgrade after a completed checkout. The period end is computed locally.
    pub fn activated(
        user_id: UserId,
        plan_id: PlanId,
        period: BillingPeriod,
        customer_id: Option<String>,
        subscription_id: Option<String>,
        paid_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            plan_id,
            status: SyncStatus::Active,
            period_end: paid_at.add_months(period.months()),
            customer_id,
            subscription_id,
            last_payment_at: Some(paid_at),
        }
    }

    /// Mirror of a provider-side subscription, status and period end verbatim.
    pub fn mirrored(
        user_id: UserId,
        plan_id: PlanId,
        provider_status: &str,
        period_end: Timestamp,
        customer_id: Option<String>,
        subscription_id: String,
    ) -> Self {
        let status = if provider_status == "active" {
            SyncStatus::Active
        } else {
            SyncStatus::Provider(provider_status.to_string())
        };
        Self {
            user_id,
            plan_id,
            status,
            period_end,
            customer_id,
            subscription_id: Some(subscription_id),
            last_payment_at: None,
        }
    }

    /// Downgrade to the free plan, effective at `effective_at`.
    pub fn downgraded(user_id: UserId, free_plan_id: PlanId, effective_at: Timestamp) -> Self {
        Self {
            user_id,
            plan_id: free_plan_id,
            status: SyncStatus::Cancelled,
            period_end: effective_at,
            customer_id: None,
            subscription_id: None,
            last_payment_at: None,
        }
    }

    /// Field assignments for the user record.
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            plan: self.plan_id.clone(),
            subscription_status: self.status.as_str().to_string(),
            stripe_customer_id: self.customer_id.clone(),
            stripe_subscription_id: self.subscription_id.clone(),
            subscription_end_date: self.period_end.to_rfc3339(),
            last_payment_date: self.last_payment_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// JSON body of a user-record patch. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilePatch {
    pub plan: PlanId,
    pub subscription_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,
    pub subscription_end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<String>,
}
