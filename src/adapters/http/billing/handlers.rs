//! HTTP handlers for billing endpoints.
//!
//! These handlers connect axum routes to the application layer handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::adapters::http::error::BillingApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CreateCheckoutSessionCommand,
    CreateCheckoutSessionHandler, GetSubscriptionStatusHandler, GetSubscriptionStatusQuery,
    HandleWebhookCommand, HandleWebhookHandler, SyncSubscriptionCommand, SyncSubscriptionHandler,
    VerifyCheckoutSessionHandler, VerifyCheckoutSessionQuery,
};
use crate::domain::billing::{PlanCatalog, PricingPolicy, WebhookError};
use crate::ports::{PaymentProvider, ProfileStore};

use super::dto::{
    CancelSubscriptionResponse, CreateCheckoutRequest, CreateCheckoutResponse,
    SubscriptionStatusResponse, SyncSubscriptionResponse, VerifySessionResponse,
    WebhookErrorResponse, WebhookReceivedResponse,
};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the billing endpoints.
#[derive(Clone)]
pub struct BillingAppState {
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub profile_store: Arc<dyn ProfileStore>,
    pub catalog: Arc<PlanCatalog>,
    pub pricing_policy: PricingPolicy,
}

impl BillingAppState {
    pub fn create_checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.payment_provider.clone(),
            self.catalog.clone(),
            self.pricing_policy,
        )
    }

    pub fn verify_session_handler(&self) -> VerifyCheckoutSessionHandler {
        VerifyCheckoutSessionHandler::new(self.payment_provider.clone())
    }

    pub fn subscription_status_handler(&self) -> GetSubscriptionStatusHandler {
        GetSubscriptionStatusHandler::new(self.payment_provider.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.payment_provider.clone())
    }

    pub fn sync_subscription_handler(&self) -> SyncSubscriptionHandler {
        SyncSubscriptionHandler::new(
            self.payment_provider.clone(),
            self.profile_store.clone(),
            self.catalog.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandleWebhookHandler {
        HandleWebhookHandler::new(
            self.payment_provider.clone(),
            self.profile_store.clone(),
            self.catalog.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/stripe/verify-session/:session_id
pub async fn verify_session(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let query = VerifyCheckoutSessionQuery {
        requester: user,
        session_id,
    };

    let result = state.verify_session_handler().handle(query).await?;

    Ok(Json(VerifySessionResponse::from(result)))
}

/// GET /api/stripe/subscription-status
pub async fn subscription_status(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let query = GetSubscriptionStatusQuery { user_id: user.id };

    let result = state.subscription_status_handler().handle(query).await?;

    Ok(Json(SubscriptionStatusResponse::from(result)))
}

/// GET /api/stripe/sync-subscription
pub async fn sync_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = SyncSubscriptionCommand { user_id: user.id };

    let result = state.sync_subscription_handler().handle(cmd).await?;

    Ok(Json(SyncSubscriptionResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/stripe/create-checkout
pub async fn create_checkout(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload.map_err(|rejection| {
        BillingApiError::from_json_rejection(rejection, &CreateCheckoutRequest::FIELDS)
    })?;

    let cmd = CreateCheckoutSessionCommand {
        requester: user,
        request: request.into(),
    };

    let result = state.create_checkout_handler().handle(cmd).await?;

    Ok(Json(CreateCheckoutResponse::from(result)))
}

/// POST /api/stripe/cancel-subscription
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = CancelSubscriptionCommand { user_id: user.id };

    let result = state.cancel_subscription_handler().handle(cmd).await?;

    Ok(Json(CancelSubscriptionResponse::from(result)))
}

/// POST /api/stripe/webhook
///
/// Authenticated by signature, not by bearer token.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    else {
        tracing::warn!("Webhook without signature header");
        return webhook_rejection(WebhookError::MissingSignature);
    };

    let cmd = HandleWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    match state.webhook_handler().handle(cmd).await {
        Ok(_) => Json(WebhookReceivedResponse { received: true }).into_response(),
        Err(e) => webhook_rejection(e),
    }
}

fn webhook_rejection(error: WebhookError) -> Response {
    (
        error.status_code(),
        Json(WebhookErrorResponse {
            error: error.public_message().to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signature_rejection_body_is_generic() {
        let response = webhook_rejection(WebhookError::TimestampOutOfRange);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid signature");
    }

    #[tokio::test]
    async fn payload_rejection_hides_parser_detail() {
        let response = webhook_rejection(WebhookError::ParseError("expected value at line 1".into()));

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid payload");
    }

    #[test]
    fn state_is_clone_send_sync() {
        fn assert_bounds<T: Clone + Send + Sync>() {}
        assert_bounds::<BillingAppState>();
    }
}
