//! Top-level router: every endpoint under `/api`, wrapped in the shared
//! tower-http layers. Each request gets an `x-request-id` (kept when the
//! caller sends one) which is echoed on the response.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::domain::billing::{PlanCatalog, PricingPolicy};
use crate::ports::{PaymentProvider, ProfileStore, SessionValidator};

use super::billing::{billing_router, BillingAppState};
use super::health::health_routes;
use super::plans::{plans_router, PlansAppState};

/// Everything the HTTP surface needs from the outside.
#[derive(Clone)]
pub struct ApiDependencies {
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub profile_store: Arc<dyn ProfileStore>,
    pub session_validator: Arc<dyn SessionValidator>,
    pub catalog: Arc<PlanCatalog>,
    pub pricing_policy: PricingPolicy,
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Builds the complete application router.
///
/// - `/api/ping`
/// - `/api/stripe/*` (bearer auth except the webhook)
/// - `/api/plans/*` (public)
pub fn api_router(deps: ApiDependencies, settings: &HttpSettings) -> Router {
    let billing = billing_router(deps.session_validator.clone()).with_state(BillingAppState {
        payment_provider: deps.payment_provider,
        profile_store: deps.profile_store,
        catalog: deps.catalog.clone(),
        pricing_policy: deps.pricing_policy,
    });

    let plans = plans_router().with_state(PlansAppState {
        catalog: deps.catalog,
    });

    let api = Router::new()
        .merge(health_routes())
        .nest("/stripe", billing)
        .nest("/plans", plans);

    Router::new()
        .nest("/api", api)
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(cors_layer(&settings.cors_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::pocketbase::MockProfileStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::catalog::test_catalog;

    fn app() -> Router {
        api_router(
            ApiDependencies {
                payment_provider: Arc::new(MockPaymentProvider::new()),
                profile_store: Arc::new(MockProfileStore::new()),
                session_validator: Arc::new(
                    MockSessionValidator::new().with_test_user("token-1", "user_1"),
                ),
                catalog: Arc::new(test_catalog()),
                pricing_policy: PricingPolicy::Catalog,
            },
            &HttpSettings::default(),
        )
    }

    #[tokio::test]
    async fn ping_is_mounted_under_api() {
        let response = app()
            .oneshot(Request::get("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = app()
            .oneshot(Request::get("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn caller_request_id_is_echoed() {
        let response = app()
            .oneshot(
                Request::get("/api/ping")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn plans_are_public() {
        let response = app()
            .oneshot(Request::get("/api/plans").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn stripe_routes_require_a_token() {
        let response = app()
            .oneshot(
                Request::get("/api/stripe/subscription-status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = app()
            .oneshot(Request::get("/plans").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn cors_skips_bad_origins() {
        let _ = cors_layer(&["https://hydro.example.com".to_string(), "bad\norigin".to_string()]);
    }
}
