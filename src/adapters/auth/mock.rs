//! In-memory [`SessionValidator`] for handler and router tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Accepts exactly the tokens it was built with. Unknown tokens are
/// `InvalidToken`; a configured error overrides every lookup.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    users: HashMap<String, AuthenticatedUser>,
    failure: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.users.insert(token.into(), user);
        self
    }

    /// Registers `token` for `user_id` with the email `<user_id>@test.example.com`.
    /// A blank id registers nothing.
    pub fn with_test_user(self, token: impl Into<String>, user_id: &str) -> Self {
        let Ok(id) = UserId::new(user_id) else {
            return self;
        };
        let email = format!("{user_id}@test.example.com");
        self.with_user(token, AuthenticatedUser::new(id, Some(email)))
    }

    pub fn with_error(mut self, error: AuthError) -> Self {
        self.failure = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.users.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}
