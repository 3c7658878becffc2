//! A logical send, replayable on any channel

use crate::domain::communication::{email_addresses::EmailAddress, errors::EmailError};

use super::{validation::validate_message, EmailMessage, EmailResult, EmailService};

/// One call on the [`EmailService`] contract, captured so the dispatcher can
/// issue the identical request on another channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmailRequest {
    /// [`EmailService::send_email`]
    Message(EmailMessage),

    /// [`EmailService::send_password_reset`]
    PasswordReset {
        /// Recipient
        to: EmailAddress,
        /// Reset token to embed in the link
        reset_token: String,
    },

    /// [`EmailService::send_welcome_email`]
    Welcome {
        /// Recipient
        to: EmailAddress,
        /// Name used in the greeting
        user_name: String,
    },

    /// [`EmailService::send_account_verification`]
    AccountVerification {
        /// Recipient
        to: EmailAddress,
        /// Verification token to embed in the link
        verification_token: String,
    },

    /// [`EmailService::send_follow_up_welcome_email`]
    FollowUpWelcome {
        /// Recipient
        to: EmailAddress,
        /// Name used in the greeting
        user_name: String,
    },
}

impl EmailRequest {
    /// Issues the request on `service`
    pub async fn send_via<S>(&self, service: &S) -> Result<EmailResult, EmailError>
    where
        S: EmailService + ?Sized,
    {
        match self {
            Self::Message(message) => service.send_email(message).await,
            Self::PasswordReset { to, reset_token } => {
                service.send_password_reset(to, reset_token).await
            }
            Self::Welcome { to, user_name } => service.send_welcome_email(to, user_name).await,
            Self::AccountVerification {
                to,
                verification_token,
            } => {
                service
                    .send_account_verification(to, verification_token)
                    .await
            }
            Self::FollowUpWelcome { to, user_name } => {
                service.send_follow_up_welcome_email(to, user_name).await
            }
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::PasswordReset { .. } => "password_reset",
            Self::Welcome { .. } => "welcome",
            Self::AccountVerification { .. } => "account_verification",
            Self::FollowUpWelcome { .. } => "follow_up_welcome",
        }
    }

    /// Checks what can be checked before a channel is chosen
    pub fn validate(&self) -> Result<(), EmailError> {
        match self {
            Self::Message(message) => validate_message(message),
            Self::PasswordReset { to, .. }
            | Self::Welcome { to, .. }
            | Self::AccountVerification { to, .. }
            | Self::FollowUpWelcome { to, .. } => {
                if to.is_valid() {
                    Ok(())
                } else {
                    Err(EmailError::InvalidRecipient(to.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::mailer::{
        EmailChannel, EmailStatus, MockChannelService,
    };

    use super::*;

    fn sent_result() -> EmailResult {
        EmailResult {
            id: uuid::Uuid::now_v7(),
            channel: EmailChannel::Primary,
            status: EmailStatus::Sent,
            sent_at: None,
            provider_message_id: None,
            error: None,
            delivery: None,
        }
    }

    #[tokio::test]
    async fn test_send_via_calls_matching_method() -> TestResult {
        let mut service = MockChannelService::new();
        let result = sent_result();
        let expected = result.clone();

        service
            .expect_send_welcome_email()
            .withf(|to, user_name| to.as_str() == "user@example.com" && user_name == "Ada")
            .times(1)
            .returning(move |_, _| Ok(result.clone()));

        let request = EmailRequest::Welcome {
            to: EmailAddress::new("user@example.com")?,
            user_name: "Ada".to_string(),
        };

        assert_eq!(request.send_via(&service).await?, expected);

        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_recipient() {
        let request = EmailRequest::PasswordReset {
            to: EmailAddress::new_unchecked("not-an-address"),
            reset_token: "t".to_string(),
        };

        assert!(matches!(
            request.validate(),
            Err(EmailError::InvalidRecipient(_))
        ));
    }
}
