//! `SessionValidator` implementations.
//!
//! `PocketBaseTokenValidator` decodes profile-store issued JWTs locally;
//! `MockSessionValidator` backs the HTTP tests.

mod mock;
mod pocketbase_token;

pub use mock::MockSessionValidator;
pub use pocketbase_token::PocketBaseTokenValidator;
