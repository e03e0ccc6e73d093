//! Hydro Billing server entry point.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hydro_billing::adapters::auth::PocketBaseTokenValidator;
use hydro_billing::adapters::http::{api_router, ApiDependencies, HttpSettings};
use hydro_billing::adapters::pocketbase::{ProfileStoreClient, ProfileStoreClientConfig};
use hydro_billing::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use hydro_billing::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use hydro_billing::domain::billing::{CatalogError, PlanCatalog};
use hydro_billing::ports::{PaymentError, ProfileStoreError};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Plan catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Payment provider client: {0}")]
    PaymentProvider(#[from] PaymentError),

    #[error("Profile store client: {0}")]
    ProfileStore(#[from] ProfileStoreError),

    #[error("Profile store URL: {0}")]
    ProfileStoreUrl(String),

    #[error("Server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        // The subscriber may not be installed if config loading failed.
        eprintln!("hydro-billing exited with error: {}", error);
        tracing::error!(error = %error, "hydro-billing exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        pricing_policy = ?config.billing.pricing_policy,
        stripe_test_mode = config.payment.is_test_mode(),
        "Configuration loaded"
    );

    let catalog = Arc::new(PlanCatalog::seeded(&config.billing.plan_ids)?);

    let stripe_config = StripeConfig::new(
        config.payment.stripe_api_key.clone(),
        config.payment.stripe_webhook_secret.clone(),
    )
    .with_base_url(config.payment.api_base_url.clone())
    .with_require_livemode(config.payment.require_livemode)
    .with_timeout(config.payment.timeout());
    let payment_provider = Arc::new(StripePaymentAdapter::new(stripe_config)?);

    let base_url = reqwest::Url::parse(&config.profile_store.base_url)
        .map_err(|e| StartupError::ProfileStoreUrl(e.to_string()))?;
    let profile_store = Arc::new(ProfileStoreClient::new(
        ProfileStoreClientConfig::new(base_url)
            .with_admin_token(config.profile_store.admin_token.clone())
            .with_timeout(config.profile_store.timeout()),
    )?);

    let session_validator = Arc::new(PocketBaseTokenValidator::from_optional_secret(
        config.auth.token_secret.as_ref(),
    ));

    let app = api_router(
        ApiDependencies {
            payment_provider,
            profile_store,
            session_validator,
            catalog,
            pricing_policy: config.billing.pricing_policy,
        },
        &HttpSettings {
            request_timeout: config.server.request_timeout(),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "hydro-billing listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("hydro-billing stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// `server.log_level`.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
