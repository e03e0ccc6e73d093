//! Request middleware shared by the billing routes.

pub mod auth;

pub use auth::{auth_middleware, AuthRejection, AuthState, RequireAuth};
