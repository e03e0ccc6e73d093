//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Commands change state at the provider or the profile store; queries only read.

pub mod handlers;

pub use handlers::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CreateCheckoutSessionCommand,
    CreateCheckoutSessionHandler, GetSubscriptionStatusHandler, GetSubscriptionStatusQuery,
    HandleWebhookCommand, HandleWebhookHandler, SubscriptionReconciler, SyncSubscriptionCommand,
    SyncSubscriptionHandler, VerifyCheckoutSessionHandler, VerifyCheckoutSessionQuery,
};
