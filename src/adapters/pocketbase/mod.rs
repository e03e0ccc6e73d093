//! Profile store adapters (PocketBase).
//!
//! - `profile_store_client` - REST client used in production
//! - `mock_profile_store` - In-memory store with call tracking for tests

mod mock_profile_store;
mod profile_store_client;

pub use mock_profile_store::MockProfileStore;
pub use profile_store_client::{plan_name_filter, ProfileStoreClient, ProfileStoreClientConfig};
