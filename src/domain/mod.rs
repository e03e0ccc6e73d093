//! Domain layer containing business logic and domain types.
//!
//! - `foundation` - Shared primitives (ids, timestamps, auth, error codes)
//! - `billing` - Plan catalog, checkout shaping, webhook events and profile sync

pub mod billing;
pub mod foundation;
