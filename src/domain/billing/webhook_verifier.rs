//! `Stripe-Signature` checking.
//!
//! Stripe signs `"{t}.{raw body}"` with HMAC-SHA256 keyed by the endpoint's
//! `whsec_` secret and sends `t=<unix>,v1=<hex>[,v1=<hex>...]`. A delivery
//! is authentic when any `v1` matches and `t` is recent. Only an authentic
//! body is ever decoded.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::provider_event::VerifiedEvent;
use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Oldest accepted signature, in seconds.
const TOLERANCE_SECS: i64 = 300;
/// How far ahead of our clock a signature may be dated.
const FUTURE_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Every `v1` entry; Stripe sends several while a secret is being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Unknown schemes such as `v0` are skipped.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let malformed = |what: &str| WebhookError::ParseError(format!("signature header: {what}"));

        let mut timestamp = None;
        let mut v1_signatures = Vec::new();
        for item in header.split(',').map(str::trim) {
            let Some((scheme, value)) = item.split_once('=') else {
                return Err(malformed("expected key=value"));
            };
            match scheme {
                "t" => timestamp = Some(value.parse::<i64>().map_err(|_| malformed("bad t"))?),
                "v1" => v1_signatures.push(hex::decode(value).map_err(|_| malformed("bad v1"))?),
                _ => {}
            }
        }

        match (timestamp, v1_signatures.is_empty()) {
            (None, _) => Err(malformed("no t")),
            (Some(_), true) => Err(malformed("no v1")),
            (Some(timestamp), false) => Ok(Self {
                timestamp,
                v1_signatures,
            }),
        }
    }
}

#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: SecretString,
    require_livemode: bool,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            require_livemode: false,
        }
    }

    /// Turns test-mode deliveries into `TestModeRejected`.
    pub fn with_require_livemode(self, require_livemode: bool) -> Self {
        Self {
            require_livemode,
            ..self
        }
    }

    /// Authenticates the raw body against the header, then decodes it.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<VerifiedEvent, WebhookError> {
        let event = self.authenticate(payload, header, chrono::Utc::now().timestamp())?;
        VerifiedEvent::from_stripe_event(&event)
    }

    fn authenticate(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(header)?;
        check_freshness(header.timestamp, now)?;

        let expected = self.sign(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| bytes_match(&expected, candidate));
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent =
            serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))?;
        if self.require_livemode && !event.livemode {
            tracing::warn!(event_id = %event.id, "test-mode webhook refused");
            return Err(WebhookError::TestModeRejected);
        }
        Ok(event)
    }

    fn sign(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn check_freshness(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;
    if age > TOLERANCE_SECS {
        tracing::warn!(signed_at = timestamp, age_secs = age, "stale webhook signature");
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -FUTURE_SKEW_SECS {
        tracing::warn!(signed_at = timestamp, "webhook signature dated in the future");
        return Err(WebhookError::InvalidTimestamp);
    }
    Ok(())
}

fn bytes_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Builds a valid `Stripe-Signature` value for `payload`.
#[cfg(test)]
pub fn test_signature_header(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
