//! Hydro Billing - Stripe and PocketBase billing bridge
//!
//! Opens hosted checkout sessions for the Hydro AI plans, verifies provider
//! webhooks and keeps each user's plan and subscription fields in the
//! profile store aligned with the payment provider.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
