//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `stripe` - Payment provider (REST) and its test double
//! - `pocketbase` - Profile store (REST) and its test double
//! - `auth` - Bearer token validation
//! - `http` - axum endpoints

pub mod auth;
pub mod http;
pub mod pocketbase;
pub mod stripe;
