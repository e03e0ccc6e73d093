//! HTTP adapters - REST API implementations.
//!
//! Each area has its own module with DTOs, handlers and routes; `router`
//! assembles them under `/api`.

pub mod billing;
pub mod error;
pub mod health;
pub mod middleware;
pub mod plans;
pub mod router;

pub use billing::{billing_router, BillingAppState};
pub use error::{BillingApiError, ErrorResponse};
pub use plans::{plans_router, PlansAppState};
pub use router::{api_router, ApiDependencies, HttpSettings};
