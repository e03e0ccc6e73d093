//! Billing-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 422 |
//! | PlanNotFound | 404 |
//! | SessionNotFound | 404 |
//! | NoActiveSubscription | 404 |
//! | PaymentProviderUnavailable | 500 |
//! | ProfileStoreUnavailable | 502 |
//! | UnmappedPlan | 500 |
//! | Internal | 500 |

use crate::domain::foundation::{ErrorCode, FieldError, UserId};

use super::CatalogError;

/// Billing errors surfaced to interactive callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// One or more request fields were rejected.
    ValidationFailed { fields: Vec<FieldError> },

    /// Plan id is not in the catalog.
    PlanNotFound(String),

    /// Checkout session unknown to the provider, or not the caller's.
    SessionNotFound(String),

    /// The user has no subscription at the provider.
    NoActiveSubscription(UserId),

    /// Talking to the payment provider failed.
    PaymentProviderUnavailable {
        message: String,
        provider_code: Option<String>,
    },

    /// Talking to the profile store failed.
    ProfileStoreUnavailable(String),

    /// A plan name has no external identifier.
    UnmappedPlan(String),

    /// Anything else.
    Internal(String),
}

impl BillingError {
    pub fn validation(fields: Vec<FieldError>) -> Self {
        BillingError::ValidationFailed { fields }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn plan_not_found(id: impl Into<String>) -> Self {
        BillingError::PlanNotFound(id.into())
    }

    pub fn session_not_found(id: impl Into<String>) -> Self {
        BillingError::SessionNotFound(id.into())
    }

    pub fn no_active_subscription(user_id: UserId) -> Self {
        BillingError::NoActiveSubscription(user_id)
    }

    pub fn payment_provider(message: impl Into<String>, provider_code: Option<String>) -> Self {
        BillingError::PaymentProviderUnavailable {
            message: message.into(),
            provider_code,
        }
    }

    pub fn profile_store(message: impl Into<String>) -> Self {
        BillingError::ProfileStoreUnavailable(message.into())
    }

    pub fn unmapped_plan(name: impl Into<String>) -> Self {
        BillingError::UnmappedPlan(name.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BillingError::Internal(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            BillingError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            BillingError::NoActiveSubscription(_) => ErrorCode::NoActiveSubscription,
            BillingError::PaymentProviderUnavailable { .. } => ErrorCode::PaymentProviderError,
            BillingError::ProfileStoreUnavailable(_) => ErrorCode::ProfileStoreUnavailable,
            BillingError::UnmappedPlan(_) => ErrorCode::UnmappedPlan,
            BillingError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a user-facing error message.
    ///
    /// Upstream failures are reported generically; their detail goes to logs only.
    pub fn message(&self) -> String {
        match self {
            BillingError::ValidationFailed { fields } => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                format!("Validation failed: {}", names.join(", "))
            }
            BillingError::PlanNotFound(id) => format!("Plan not found: {}", id),
            BillingError::SessionNotFound(_) => "Session not found".to_string(),
            BillingError::NoActiveSubscription(_) => "No active subscription found".to_string(),
            BillingError::PaymentProviderUnavailable { .. } => {
                "Payment provider unavailable, please retry".to_string()
            }
            BillingError::ProfileStoreUnavailable(_) => {
                "Profile store unavailable, please retry".to_string()
            }
            BillingError::UnmappedPlan(name) => format!("Plan '{}' is not mapped", name),
            BillingError::Internal(_) => "Internal error".to_string(),
        }
    }

    /// Returns true if the caller may safely retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::PaymentProviderUnavailable { .. }
                | BillingError::ProfileStoreUnavailable(_)
        )
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<CatalogError> for BillingError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::PlanNotFound(id) => BillingError::plan_not_found(id),
            CatalogError::ComparisonSize(_) => {
                BillingError::invalid_field("plan_ids", err.to_string())
            }
            other => BillingError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_fields() {
        let err = BillingError::validation(vec![
            FieldError::new("amount", "must be positive"),
            FieldError::new("currency", "must be 3 letters"),
        ]);

        assert_eq!(err.message(), "Validation failed: amount, currency");
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn provider_failure_message_is_generic() {
        let err = BillingError::payment_provider(
            "Stripe API error: card_declined sk_test_xyz",
            Some("card_declined".to_string()),
        );

        assert!(!err.message().contains("sk_test"));
        assert!(err.is_retryable());
    }

    #[test]
    fn not_found_errors_are_not_retryable() {
        assert!(!BillingError::plan_not_found("x").is_retryable());
        assert!(!BillingError::session_not_found("cs_1").is_retryable());
        assert!(!BillingError::no_active_subscription(UserId::new("u").unwrap()).is_retryable());
    }

    #[test]
    fn display_uses_message() {
        let err = BillingError::plan_not_found("pb_gold");
        assert_eq!(format!("{}", err), "Plan not found: pb_gold");
    }

    #[test]
    fn catalog_errors_map_to_billing_errors() {
        assert_eq!(
            BillingError::from(CatalogError::PlanNotFound("pb_x".into())),
            BillingError::plan_not_found("pb_x")
        );
        assert_eq!(
            BillingError::from(CatalogError::ComparisonSize(5)).code(),
            ErrorCode::ValidationFailed
        );
    }
}
