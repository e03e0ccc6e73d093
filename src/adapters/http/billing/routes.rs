//! Axum router configuration for billing endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{auth_middleware, AuthState};

use super::handlers::{
    cancel_subscription, create_checkout, handle_stripe_webhook, subscription_status,
    sync_subscription, verify_session, BillingAppState,
};

/// Routes that require a bearer token.
///
/// - `POST /create-checkout`
/// - `GET /verify-session/:session_id`
/// - `GET /subscription-status`
/// - `POST /cancel-subscription`
/// - `GET /sync-subscription`
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/create-checkout", post(create_checkout))
        .route("/verify-session/:session_id", get(verify_session))
        .route("/subscription-status", get(subscription_status))
        .route("/cancel-subscription", post(cancel_subscription))
        .route("/sync-subscription", get(sync_subscription))
}

/// Provider callbacks, verified by signature.
///
/// - `POST /webhook`
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/webhook", post(handle_stripe_webhook))
}

/// Billing router for mounting at `/api/stripe`.
///
/// The auth layer wraps only the user routes; the webhook stays reachable
/// without a token.
pub fn billing_router(auth: AuthState) -> Router<BillingAppState> {
    billing_routes()
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware))
        .merge(webhook_routes())
}
