//! API error-handling module

use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::communication::{email_addresses::EmailAddressError, errors::EmailError};

/// An error response
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// The error message
    #[schema(example = "Internal server error")]
    pub error: String,
}

/// An error raised in the API
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApiError {
    /// The status code
    #[schema(example = 500, value_type = u16)]
    #[serde(with = "http_serde::status_code")]
    pub status: StatusCode,

    /// The error message
    #[schema(example = "Internal server error")]
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    /// Create a new unprocessable entity error
    pub fn new_422(message: &str) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Create a new too many requests error
    pub fn new_429(message: &str) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// Create a new bad gateway error
    pub fn new_502(message: &str) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    /// Create a new service unavailable error
    pub fn new_503(message: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<EmailAddressError> for ApiError {
    fn from(err: EmailAddressError) -> Self {
        match err {
            EmailAddressError::EmptyEmailAddress => {
                ApiError::new_422("Please provide an email address")
            }
            EmailAddressError::InvalidEmailAddress => {
                ApiError::new_422("Please provide a valid email address")
            }
        }
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        let message = err.to_string();

        match err {
            err if err.is_validation_error() => ApiError::new_422(&message),
            EmailError::TemplateVariableMissing(_) => ApiError::new_422(&message),
            EmailError::PrimaryServiceUnavailable | EmailError::AllServicesUnavailable => {
                warn!(%message, "email could not be sent");
                ApiError::new_503(&message)
            }
            EmailError::RateLimited { .. } | EmailError::QuotaExceeded => {
                ApiError::new_429(&message)
            }
            _ => {
                warn!(%message, "email could not be sent");
                ApiError::new_502(&message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), &rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn test_error_response() -> TestResult {
        let error = ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        };

        let response = error.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await?;

        assert_eq!(body, r#"{"error":"Internal server error"}"#);

        Ok(())
    }

    #[test]
    fn test_api_error_from_error() {
        let error = anyhow!("Internal server error");
        let api_error = ApiError::from(error);

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.message, "Internal server error");
    }

    #[test]
    fn test_api_error_from_email_error() {
        let cases = [
            (EmailError::EmptySubject, StatusCode::UNPROCESSABLE_ENTITY),
            (
                EmailError::TemplateVariableMissing("user_name".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                EmailError::AllServicesUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                EmailError::PrimaryServiceUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                EmailError::RateLimited {
                    retry_after: Some(Duration::from_secs(5)),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (EmailError::QuotaExceeded, StatusCode::TOO_MANY_REQUESTS),
            (EmailError::TimeoutError, StatusCode::BAD_GATEWAY),
            (EmailError::AuthenticationFailed, StatusCode::BAD_GATEWAY),
        ];

        for (error, status) in cases {
            let message = error.to_string();
            let api_error = ApiError::from(error);

            assert_eq!(api_error.status, status, "{message}");
            assert_eq!(api_error.message, message);
        }
    }

    #[test]
    fn test_api_error_from_email_address_error() {
        let api_error = ApiError::from(EmailAddressError::InvalidEmailAddress);

        assert_eq!(api_error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api_error.message, "Please provide a valid email address");
    }
}
