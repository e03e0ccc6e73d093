//! Primitives shared by the billing domain and the adapters.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, FALLBACK_CUSTOMER_EMAIL};
pub use errors::{ErrorCode, FieldError, ValidationError};
pub use ids::{PlanId, UserId};
pub use timestamp::Timestamp;
