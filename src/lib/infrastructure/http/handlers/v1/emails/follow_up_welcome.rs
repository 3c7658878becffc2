//! Follow-up welcome email handler

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

/// Follow-up welcome request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowUpWelcomeBody {
    /// The user's email address
    #[schema(example = "email@example.com")]
    email: String,

    /// Name used in the greeting
    #[schema(example = "Ada")]
    user_name: String,
}

/// Send the follow-up welcome email
#[utoipa::path(
    post,
    operation_id = "send_follow_up_welcome_email",
    tag = "Emails",
    path = "/api/v1/emails/follow-up-welcome",
    request_body = FollowUpWelcomeBody,
    responses(
        (status = StatusCode::ACCEPTED, description = "Email sent", body = EmailSentResponse),
        (status = StatusCode::TOO_MANY_REQUESTS, description = "Provider is throttling", body = ErrorResponse),
    )
)]
pub async fn handler<D: EmailDispatch>(
    State(state): State<AppState<D>>,
    request: Result<Json<FollowUpWelcomeBody>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailSentResponse>), ApiError> {
    let Json(request) = request?;
    let to = EmailAddress::new(&request.email)?;

    let result = state
        .email
        .send_follow_up_welcome_email(&to, &request.user_name)
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
            errors::ErrorResponse, handlers::v1::emails::tests::sent_on, router,
            state::tests::test_state,
        },
    };

    use super::FollowUpWelcomeBody;

    fn body() -> FollowUpWelcomeBody {
        FollowUpWelcomeBody {
            email: "ada@example.com".to_string(),
            user_name: "Ada".to_string(),
        }
    }

    #[tokio::test]
    async fn test_follow_up_welcome_sent() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_send_follow_up_welcome_email()
            .times(1)
            .returning(|_, _| Ok(sent_on(EmailChannel::Primary)));

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/follow-up-welcome")
            .json(&body())
            .await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);

        Ok(())
    }

    #[tokio::test]
    async fn test_follow_up_welcome_rate_limited() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_send_follow_up_welcome_email()
            .returning(|_, _| Err(EmailError::RateLimited { retry_after: None }));

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/follow-up-welcome")
            .json(&body())
            .await;

        let json = response.json::<ErrorResponse>();

        assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json.error, "rate limited by the email provider");

        Ok(())
    }
}
