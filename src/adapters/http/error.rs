//! Error responses shared by the billing and plan endpoints.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::billing::{BillingError, CatalogError};
use crate::domain::foundation::{ErrorCode, FieldError};

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(pub BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl From<CatalogError> for BillingApiError {
    fn from(err: CatalogError) -> Self {
        Self(err.into())
    }
}

impl BillingApiError {
    /// Turns an unreadable JSON body into a field-level validation failure.
    ///
    /// A type error on one of `known_fields` is reported against that field;
    /// anything else is reported against `body`. Parser text never reaches
    /// the client.
    pub fn from_json_rejection(rejection: JsonRejection, known_fields: &[&str]) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "Unreadable JSON body");

        let field = match &rejection {
            JsonRejection::JsonDataError(_) => {
                let text = rejection.body_text();
                rejected_field(&text, known_fields).map(str::to_string)
            }
            _ => None,
        };
        let error = match (field, &rejection) {
            (Some(field), _) => FieldError::new(field, "has the wrong type"),
            (None, JsonRejection::MissingJsonContentType(_)) => {
                FieldError::new("body", "Content-Type must be application/json")
            }
            (None, _) => FieldError::new("body", "must be a valid JSON object"),
        };
        Self(BillingError::validation(vec![error]))
    }

    pub fn status_code(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PlanNotFound
            | ErrorCode::SessionNotFound
            | ErrorCode::NoActiveSubscription => StatusCode::NOT_FOUND,
            ErrorCode::ProfileStoreUnavailable => StatusCode::BAD_GATEWAY,
            ErrorCode::PaymentProviderError
            | ErrorCode::UnmappedPlan
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Finds the offending field in axum's `"...target type: <path>: <error>"` text.
fn rejected_field<'a>(text: &str, known_fields: &[&'a str]) -> Option<&'a str> {
    let (_, detail) = text.split_once("target type: ")?;
    let (path, _) = detail.split_once(": ")?;
    let top = path.split(['.', '[']).next()?;
    known_fields.iter().copied().find(|known| *known == top)
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.0.code().to_string();

        if status.is_server_error() {
            tracing::error!(
                code = %code,
                error = ?self.0,
                retryable = self.0.is_retryable(),
                "Request failed"
            );
        }

        let body = match &self.0 {
            BillingError::ValidationFailed { fields } => ErrorResponse::with_details(
                code,
                self.0.message(),
                serde_json::to_value(fields).unwrap_or_default(),
            ),
            other => ErrorResponse::new(code, other.message()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_table() {
        let cases = [
            (BillingError::invalid_field("amount", "bad"), 422),
            (BillingError::plan_not_found("p"), 404),
            (BillingError::session_not_found("cs"), 404),
            (
                BillingError::no_active_subscription(UserId::new("u").unwrap()),
                404,
            ),
            (BillingError::payment_provider("down", None), 500),
            (BillingError::profile_store("down"), 502),
            (BillingError::unmapped_plan("Gold"), 500),
            (BillingError::internal("x"), 500),
        ];

        for (err, expected) in cases {
            assert_eq!(
                BillingApiError(err.clone()).status_code().as_u16(),
                expected,
                "{:?}",
                err
            );
        }
    }

    #[tokio::test]
    async fn validation_failure_lists_fields_in_details() {
        let err = BillingError::validation(vec![
            FieldError::new("amount", "must be greater than 0"),
            FieldError::new("currency", "must be a 3-letter currency code"),
        ]);

        let response = BillingApiError(err).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["details"][0]["field"], "amount");
        assert_eq!(body["details"][1]["field"], "currency");
    }

    #[tokio::test]
    async fn upstream_detail_is_not_leaked() {
        let response = BillingApiError(BillingError::payment_provider(
            "Invalid API Key provided: sk_test_****",
            Some("api_key_invalid".to_string()),
        ))
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["code"], "PAYMENT_PROVIDER_ERROR");
        assert!(!body.to_string().contains("sk_test"));
        assert!(body.get("details").is_none());
    }

    #[test]
    fn rejected_field_reads_the_serde_path() {
        let fields = ["amount", "is_yearly", "metadata"];
        let text = "Failed to deserialize the JSON body into the target type: \
                    is_yearly: invalid type: string \"yes\", expected a boolean at line 1 column 20";

        assert_eq!(rejected_field(text, &fields), Some("is_yearly"));
        assert_eq!(
            rejected_field(
                "Failed to deserialize the JSON body into the target type: metadata.tier: invalid type",
                &fields
            ),
            Some("metadata")
        );
        assert_eq!(
            rejected_field(
                "Failed to deserialize the JSON body into the target type: invalid type: integer `3`",
                &fields
            ),
            None
        );
    }
}
