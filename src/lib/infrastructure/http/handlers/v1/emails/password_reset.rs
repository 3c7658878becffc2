//! Password reset email handler

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::communication::{dispatch::EmailDispatch, email_addresses::EmailAddress},
    infrastructure::http::{
        errors::ApiError,
        handlers::v1::emails::EmailSentResponse,
        state::AppState,
    },
};

/// Password reset request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetBody {
    /// The account's email address
    #[schema(example = "email@example.com")]
    email: String,

    /// Token embedded in the reset link
    #[schema(example = "7f4c2a9e")]
    reset_token: String,
}

/// Send a password reset email
#[utoipa::path(
    post,
    operation_id = "send_password_reset",
    tag = "Emails",
    path = "/api/v1/emails/password-reset",
    request_body = PasswordResetBody,
    responses(
        (status = StatusCode::ACCEPTED, description = "Email sent", body = EmailSentResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Unprocessable entity", body = ErrorResponse),
        (status = StatusCode::SERVICE_UNAVAILABLE, description = "No channel can send", body = ErrorResponse, example = json!({ "error": "all email services are unavailable" })),
    )
)]
pub async fn handler<D: EmailDispatch>(
    State(state): State<AppState<D>>,
    request: Result<Json<PasswordResetBody>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailSentResponse>), ApiError> {
    let Json(request) = request?;
    let to = EmailAddress::new(&request.email)?;

    let result = state
        .email
        .send_password_reset(&to, &request.reset_token)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(result.into())))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use testresult::TestResult;

    use crate::{
        domain::communication::{
            dispatch::MockEmailDispatch, errors::EmailError, mailer::EmailChannel,
        },
        infrastructure::http::{
            errors::ErrorResponse,
            handlers::v1::emails::{tests::sent_on, EmailSentResponse},
            router,
            state::tests::test_state,
        },
    };

    use super::PasswordResetBody;

    impl PasswordResetBody {
        fn new(email: &str, reset_token: &str) -> Self {
            Self {
                email: email.to_string(),
                reset_token: reset_token.to_string(),
            }
        }
    }

    #[tokio::test]
    async fn test_password_reset_sent() -> TestResult {
        let mut email = MockEmailDispatch::new();
        let result = sent_on(EmailChannel::Primary);
        let id = result.id;

        email
            .expect_send_password_reset()
            .withf(|to, token| to.as_str() == "email@example.com" && token == "abc123")
            .times(1)
            .returning(move |_, _| Ok(result.clone()));

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/password-reset")
            .json(&PasswordResetBody::new("email@example.com", "abc123"))
            .await;

        let json = response.json::<EmailSentResponse>();

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert_eq!(json.id, id);
        assert_eq!(json.channel, EmailChannel::Primary);
        assert_eq!(json.provider_message_id.as_deref(), Some("re_123"));

        Ok(())
    }

    #[tokio::test]
    async fn test_password_reset_invalid_email() -> TestResult {
        let response = TestServer::new(router(test_state(None)))?
            .post("/api/v1/emails/password-reset")
            .json(&PasswordResetBody::new("not an email", "abc123"))
            .await;

        let json = response.json::<ErrorResponse>();

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json.error, "Please provide a valid email address");

        Ok(())
    }

    #[tokio::test]
    async fn test_password_reset_no_channel_available() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_send_password_reset()
            .returning(|_, _| Err(EmailError::AllServicesUnavailable));

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/password-reset")
            .json(&PasswordResetBody::new("email@example.com", "abc123"))
            .await;

        let json = response.json::<ErrorResponse>();

        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json.error, "all email services are unavailable");

        Ok(())
    }
}
