//! Billing handlers.
//!
//! ## Commands
//! - Creating checkout sessions
//! - Handling provider webhooks
//! - Cancelling subscriptions at period end
//! - Forcing a subscription sync
//!
//! ## Queries
//! - Verifying a returning checkout session
//! - Subscription status

mod cancel_subscription;
mod create_checkout_session;
mod get_subscription_status;
mod handle_webhook;
pub mod reconciler;
mod sync_subscription;
mod verify_checkout_session;

// Commands
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use create_checkout_session::{
    CheckoutSessionCreated, CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
};
pub use handle_webhook::{HandleWebhookCommand, HandleWebhookHandler, WebhookAck, WebhookOutcome};
pub use sync_subscription::{
    SyncSubscriptionCommand, SyncSubscriptionHandler, SyncSubscriptionResult,
};

// Queries
pub use get_subscription_status::{
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, SubscriptionStatusResult,
    UNKNOWN_PLAN_NAME,
};
pub use verify_checkout_session::{
    CheckoutSessionVerified, VerifyCheckoutSessionHandler, VerifyCheckoutSessionQuery,
};

pub use reconciler::{ReconcileError, SubscriptionReconciler};
