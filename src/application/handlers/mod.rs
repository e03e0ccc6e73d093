//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod billing;

pub use billing::{
    // Commands
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    CheckoutSessionCreated, CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
    HandleWebhookCommand, HandleWebhookHandler, WebhookAck, WebhookOutcome,
    SyncSubscriptionCommand, SyncSubscriptionHandler, SyncSubscriptionResult,
    // Queries
    CheckoutSessionVerified, VerifyCheckoutSessionHandler, VerifyCheckoutSessionQuery,
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, SubscriptionStatusResult,
    // Reconciliation
    ReconcileError, SubscriptionReconciler,
};
