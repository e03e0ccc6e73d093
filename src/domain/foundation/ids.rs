//! Identifiers issued by the profile store.
//!
//! Both are opaque record ids; this crate only checks they are non-blank.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(
    /// Record id of a user in the profile store.
    UserId,
    "user_id"
);

record_id!(
    /// Record id of a plan in the profile store's plan collection.
    PlanId,
    "plan_id"
);
