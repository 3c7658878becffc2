//! Welcome email handler

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

/// Welcome email request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WelcomeBody {
    /// The new user's email address
    #[schema(example = "email@example.com")]
    email: String,

    /// Name used in the greeting
    #[schema(example = "Ada")]
    user_name: String,
}

/// Send a welcome email
#[utoipa::path(
    post,
    operation_id = "send_welcome_email",
    tag = "Emails",
    path = "/api/v1/emails/welcome",
    request_body = WelcomeBody,
    responses(
        (status = StatusCode::ACCEPTED, description = "Email sent", body = EmailSentResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Unprocessable entity", body = ErrorResponse),
        (status = StatusCode::BAD_GATEWAY, description = "Delivery failed", body = ErrorResponse),
    )
)]
pub async fn handler<D: EmailDispatch>(
    State(state): State<AppState<D>>,
    request: Result<Json<WelcomeBody>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailSentResponse>), ApiError> {
    let Json(request) = request?;
    let to = EmailAddress::new(&request.email)?;

    let result = state
        .email
        .send_welcome_email(&to, &request.user_name)
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

    use super::WelcomeBody;

    fn body(email: &str) -> WelcomeBody {
        WelcomeBody {
            email: email.to_string(),
            user_name: "Ada".to_string(),
        }
    }

    #[tokio::test]
    async fn test_welcome_sent_via_fallback() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_send_welcome_email()
            .withf(|to, name| to.as_str() == "ada@example.com" && name == "Ada")
            .times(1)
            .returning(|_, _| Ok(sent_on(EmailChannel::Fallback)));

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/welcome")
            .json(&body("ada@example.com"))
            .await;

        let json = response.json::<EmailSentResponse>();

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert_eq!(json.channel, EmailChannel::Fallback);

        Ok(())
    }

    #[tokio::test]
    async fn test_welcome_empty_email() -> TestResult {
        let response = TestServer::new(router(test_state(None)))?
            .post("/api/v1/emails/welcome")
            .json(&body(""))
            .await;

        let json = response.json::<ErrorResponse>();

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json.error, "Please provide an email address");

        Ok(())
    }

    #[tokio::test]
    async fn test_welcome_provider_failure() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_send_welcome_email()
            .returning(|_, _| Err(EmailError::TimeoutError));

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/welcome")
            .json(&body("ada@example.com"))
            .await;

        let json = response.json::<ErrorResponse>();

        assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(json.error, "request to the email provider timed out");

        Ok(())
    }
}
