//! Webhook error types for Stripe webhook handling.
//!
//! Every variant here is a rejection of the delivery itself. Failures that
//! happen after a delivery is verified (profile store down, unmapped plan)
//! are not webhook errors: the delivery is acknowledged and the failure logged.

use http::StatusCode;
use thiserror::Error;

/// Errors that reject an inbound webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// No Stripe-Signature header on the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or the event envelope.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Envelope parsed, but the object did not match its event kind.
    #[error("Malformed {kind} payload: {reason}")]
    MalformedPayload { kind: &'static str, reason: String },

    /// A test-mode event arrived while live mode is required.
    #[error("Test mode event rejected")]
    TestModeRejected,
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    ///
    /// All rejections are 400; Stripe retries any non-2xx on its own schedule.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// True for authentication failures of the delivery.
    pub fn is_signature_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
        )
    }

    /// Message safe to return to the caller. Never includes parser detail.
    pub fn public_message(&self) -> &'static str {
        if self.is_signature_failure() {
            "Invalid signature"
        } else {
            "Invalid payload"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signature_displays_correctly() {
        let err = WebhookError::InvalidSignature;
        assert_eq!(format!("{}", err), "Invalid signature");
    }

    #[test]
    fn malformed_payload_displays_kind_and_reason() {
        let err = WebhookError::MalformedPayload {
            kind: "checkout.session.completed",
            reason: "missing field `id`".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Malformed checkout.session.completed payload: missing field `id`"
        );
    }

    #[test]
    fn every_rejection_is_bad_request() {
        for err in [
            WebhookError::MissingSignature,
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
            WebhookError::ParseError("x".to_string()),
            WebhookError::TestModeRejected,
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn public_message_hides_parse_details() {
        let err = WebhookError::ParseError("expected value at line 1 column 1".to_string());
        assert_eq!(err.public_message(), "Invalid payload");
        assert!(!err.public_message().contains("line"));
    }

    #[test]
    fn replay_failures_read_as_invalid_signature() {
        assert_eq!(WebhookError::TimestampOutOfRange.public_message(), "Invalid signature");
        assert_eq!(WebhookError::InvalidTimestamp.public_message(), "Invalid signature");
    }
}
