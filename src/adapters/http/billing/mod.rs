//! HTTP adapter for billing endpoints.
//!
//! Mounted at `/api/stripe`:
//! - `POST /create-checkout` - Open a checkout session
//! - `GET /verify-session/:session_id` - Check a returning checkout
//! - `GET /subscription-status` - Current user's subscription
//! - `POST /cancel-subscription` - Cancel at period end
//! - `GET /sync-subscription` - Force the user record to match the provider
//! - `POST /webhook` - Provider callbacks (signature verified)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{BillingAppState, SIGNATURE_HEADER};
pub use routes::billing_router;
