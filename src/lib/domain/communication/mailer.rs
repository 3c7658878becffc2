//! Email service module

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::{email_addresses::EmailAddress, errors::EmailError};

mod attachment;
mod health;
mod message;
mod request;
mod result;
mod validation;

pub use attachment::{Attachment, ALLOWED_ATTACHMENT_TYPES, MAX_ATTACHMENT_SIZE};
pub use health::{ChannelMetrics, ServiceHealthStatus};
pub use message::{
    EmailContent, EmailMessage, EmailMessageBuilder, EmailMetadata, EmailPriority, EmailTag,
};
pub use request::EmailRequest;
pub use result::{DeliveryMetadata, EmailChannel, EmailResult, EmailStatus};
pub use validation::{validate_html, validate_message};

/// Email service
///
/// The caller-facing contract, fulfilled by every channel and by the
/// dispatcher in front of them.
#[async_trait]
pub trait EmailService: Send + Sync + 'static {
    /// Send an arbitrary message
    ///
    /// # Arguments
    /// * `message` - The [`EmailMessage`] to send.
    ///
    /// # Returns
    /// - [`Ok`] with the terminal [`EmailResult`].
    /// - [`Err`] with the [`EmailError`] that stopped the send.
    async fn send_email(&self, message: &EmailMessage) -> Result<EmailResult, EmailError>;

    /// Send a password reset link
    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        reset_token: &str,
    ) -> Result<EmailResult, EmailError>;

    /// Send the welcome email
    async fn send_welcome_email(
        &self,
        to: &EmailAddress,
        user_name: &str,
    ) -> Result<EmailResult, EmailError>;

    /// Send an account verification link
    async fn send_account_verification(
        &self,
        to: &EmailAddress,
        verification_token: &str,
    ) -> Result<EmailResult, EmailError>;

    /// Send the follow-up welcome email
    async fn send_follow_up_welcome_email(
        &self,
        to: &EmailAddress,
        user_name: &str,
    ) -> Result<EmailResult, EmailError>;
}

/// A single delivery channel, with its own health and statistics
#[async_trait]
pub trait EmailChannelService: EmailService {
    /// Which channel this is
    fn channel(&self) -> EmailChannel;

    /// Probe the underlying provider and update the health status
    async fn health_check(&self) -> ServiceHealthStatus;

    /// Last known health status, without probing
    fn health_status(&self) -> ServiceHealthStatus;

    /// Statistics snapshot
    fn metrics(&self) -> ChannelMetrics;
}

#[cfg(test)]
mock! {
    pub ChannelService {}

    #[async_trait]
    impl EmailService for ChannelService {
        async fn send_email(&self, message: &EmailMessage) -> Result<EmailResult, EmailError>;
        async fn send_password_reset(&self, to: &EmailAddress, reset_token: &str) -> Result<EmailResult, EmailError>;
        async fn send_welcome_email(&self, to: &EmailAddress, user_name: &str) -> Result<EmailResult, EmailError>;
        async fn send_account_verification(&self, to: &EmailAddress, verification_token: &str) -> Result<EmailResult, EmailError>;
        async fn send_follow_up_welcome_email(&self, to: &EmailAddress, user_name: &str) -> Result<EmailResult, EmailError>;
    }

    #[async_trait]
    impl EmailChannelService for ChannelService {
        fn channel(&self) -> EmailChannel;
        async fn health_check(&self) -> ServiceHealthStatus;
        fn health_status(&self) -> ServiceHealthStatus;
        fn metrics(&self) -> ChannelMetrics;
    }
}
