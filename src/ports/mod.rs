//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` - Checkout sessions, subscriptions, webhook verification
//! - `ProfileStore` - User and plan records owned by the profile store
//! - `SessionValidator` - Bearer token validation

mod payment_provider;
mod profile_store;
mod session_validator;

pub use payment_provider::{
    select_user_subscription, CheckoutSession, CheckoutSessionDetails, PaymentError,
    PaymentErrorCode, PaymentProvider, Subscription, SubscriptionStatus, SUBSCRIPTION_SCAN_LIMIT,
};
pub use profile_store::{PlanRecord, ProfileStore, ProfileStoreError};
pub use session_validator::SessionValidator;
