//! Billing domain - plans, checkout shaping, webhook events and the
//! subscription state pushed to the profile store.

mod billing_period;
pub mod catalog;
pub mod checkout;
mod errors;
mod plan;
mod provider_event;
pub mod stripe_event;
mod sync;
mod webhook_errors;
pub mod webhook_verifier;

pub use billing_period::BillingPeriod;
pub use catalog::{CatalogError, PlanCatalog, PlanComparison, PriceQuote};
pub use checkout::{
    build_session_request, to_minor_units, CheckoutRequest, CheckoutSessionRequest, LineItem,
    PricingPolicy,
};
pub use errors::BillingError;
pub use plan::{cents_to_major, round2, Plan};
pub use provider_event::{
    CheckoutSessionObject, InvoiceObject, ProviderEvent, SubscriptionObject, VerifiedEvent,
};
pub use stripe_event::{StripeEvent, StripeEventType};
pub use sync::{ProfilePatch, SubscriptionSyncResult, SyncStatus};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};
