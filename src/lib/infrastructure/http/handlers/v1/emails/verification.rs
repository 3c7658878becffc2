//! Account verification email handler

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

/// Account verification request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VerificationBody {
    /// The address to verify
    #[schema(example = "email@example.com")]
    email: String,

    /// Token embedded in the verification link
    #[schema(example = "c0ffee")]
    verification_token: String,
}

/// Send an account verification email
#[utoipa::path(
    post,
    operation_id = "send_account_verification",
    tag = "Emails",
    path = "/api/v1/emails/verification",
    request_body = VerificationBody,
    responses(
        (status = StatusCode::ACCEPTED, description = "Email sent", body = EmailSentResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Unprocessable entity", body = ErrorResponse),
    )
)]
pub async fn handler<D: EmailDispatch>(
    State(state): State<AppState<D>>,
    request: Result<Json<VerificationBody>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailSentResponse>), ApiError> {
    let Json(request) = request?;
    let to = EmailAddress::new(&request.email)?;

    let result = state
        .email
        .send_account_verification(&to, &request.verification_token)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(result.into())))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::communication::{
            dispatch::MockEmailDispatch,
            errors::EmailError,
            mailer::{EmailChannel, EmailStatus},
        },
        infrastructure::http::{
            errors::ErrorResponse,
            handlers::v1::emails::{tests::sent_on, EmailSentResponse},
            router,
            state::tests::test_state,
        },
    };

    #[tokio::test]
    async fn test_verification_sent() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_send_account_verification()
            .withf(|to, token| to.as_str() == "email@example.com" && token == "c0ffee")
            .times(1)
            .returning(|_, _| Ok(sent_on(EmailChannel::Primary)));

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/verification")
            .json(&json!({ "email": "email@example.com", "verification_token": "c0ffee" }))
            .await;

        let json = response.json::<EmailSentResponse>();

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert_eq!(json.channel, EmailChannel::Primary);
        assert_eq!(json.status, EmailStatus::Sent);

        Ok(())
    }

    #[tokio::test]
    async fn test_verification_missing_template_variable() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email.expect_send_account_verification().returning(|_, _| {
            Err(EmailError::TemplateVariableMissing(
                "verification_url".to_string(),
            ))
        });

        let response = TestServer::new(router(test_state(Some(email))))?
            .post("/api/v1/emails/verification")
            .json(&json!({ "email": "email@example.com", "verification_token": "" }))
            .await;

        let json = response.json::<ErrorResponse>();

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json.error,
            "template variable \"verification_url\" is missing"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_verification_missing_field() -> TestResult {
        let response = TestServer::new(router(test_state(None)))?
            .post("/api/v1/emails/verification")
            .json(&json!({ "email": "email@example.com" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response
            .json::<ErrorResponse>()
            .error
            .contains("verification_token"));

        Ok(())
    }
}
