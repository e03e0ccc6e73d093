//! Bearer-token authentication for the user-facing billing routes.
//!
//! [`auth_middleware`] resolves the `Authorization` header through the
//! [`SessionValidator`] port and stores the [`AuthenticatedUser`] in the
//! request extensions. Handlers take [`RequireAuth`] to read it back.
//! A request without a header passes the middleware untouched and is
//! turned away by the extractor, so public routes can share the layer.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

pub type AuthState = Arc<dyn SessionValidator>;

pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return next.run(request).await;
    };

    match validator.validate(&token).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, "bearer token accepted");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(error) => AuthRejection::Rejected(error).into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

/// The caller resolved by [`auth_middleware`]; 401 when absent.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Rejected(AuthError::MissingToken))
    }
}

#[derive(Debug, Clone)]
pub enum AuthRejection {
    Rejected(AuthError),
}

impl AuthRejection {
    fn status(&self) -> StatusCode {
        match self {
            AuthRejection::Rejected(AuthError::ServiceUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AuthRejection::Rejected(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let AuthRejection::Rejected(error) = self;

        // Validator internals stay in the log.
        let message = match &error {
            AuthError::ServiceUnavailable(detail) => {
                tracing::error!(error = %detail, "session validator unavailable");
                "Authentication service unavailable".to_string()
            }
            other => {
                tracing::debug!(code = other.code(), "bearer token rejected");
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message, "code": error.code() }))).into_response()
    }
}
