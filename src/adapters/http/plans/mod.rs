//! HTTP adapter for the public plan catalog, mounted at `/api/plans`.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PlansAppState;
pub use routes::plans_router;
