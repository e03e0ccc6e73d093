//! Stripe implementation of the `PaymentProvider` port.
//!
//! Talks form-encoded REST to `api.stripe.com` with the secret key as basic
//! auth. Checkout sessions carry inline recurring prices, so no Stripe-side
//! product catalog is needed. Webhook bodies go through
//! `StripeWebhookVerifier` before anything is decoded.

mod api_types;
mod mock_payment_provider;
mod stripe_adapter;

pub use api_types::{
    error_from_response, StripeCheckoutSession, StripeErrorBody, StripeList, StripeSubscription,
};
pub use mock_payment_provider::{subscription_fixture, MethodCall, MockPaymentProvider};
pub use stripe_adapter::{checkout_form_params, StripeConfig, StripePaymentAdapter};
