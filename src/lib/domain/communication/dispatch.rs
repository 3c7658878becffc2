//! Dispatch across the primary and fallback channels

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::{mailer::EmailChannel, templates::TemplateCacheStatistics};

#[cfg(test)]
use crate::domain::communication::{
    email_addresses::EmailAddress,
    errors::EmailError,
    mailer::{EmailMessage, EmailResult},
};

use super::mailer::EmailService;

mod dispatcher;
mod metrics;
mod selector;

pub use dispatcher::EmailDispatcher;
pub use metrics::{overall_health, DispatchMetrics, HealthReport};
pub use selector::{is_usable, EmailServiceSelector, SelectorPolicy};

/// Operational control over a dispatcher, on top of sending
#[async_trait]
pub trait EmailDispatch: EmailService {
    /// Pins sends to `channel`, or returns to automatic selection with `None`
    fn switch_channel(&self, channel: Option<EmailChannel>);

    /// Probes both channels
    async fn perform_health_check(&self) -> HealthReport;

    /// Statistics snapshot
    fn service_metrics(&self) -> DispatchMetrics;

    /// Drops cached templates so the next send reloads them
    async fn clear_template_cache(&self);

    /// Template cache counters
    async fn template_cache_statistics(&self) -> TemplateCacheStatistics;
}

#[cfg(test)]
mock! {
    pub EmailDispatch {}

    #[async_trait]
    impl EmailService for EmailDispatch {
        async fn send_email(&self, message: &EmailMessage) -> Result<EmailResult, EmailError>;
        async fn send_password_reset(&self, to: &EmailAddress, reset_token: &str) -> Result<EmailResult, EmailError>;
        async fn send_welcome_email(&self, to: &EmailAddress, user_name: &str) -> Result<EmailResult, EmailError>;
        async fn send_account_verification(&self, to: &EmailAddress, verification_token: &str) -> Result<EmailResult, EmailError>;
        async fn send_follow_up_welcome_email(&self, to: &EmailAddress, user_name: &str) -> Result<EmailResult, EmailError>;
    }

    #[async_trait]
    impl EmailDispatch for EmailDispatch {
        fn switch_channel(&self, channel: Option<EmailChannel>);
        async fn perform_health_check(&self) -> HealthReport;
        fn service_metrics(&self) -> DispatchMetrics;
        async fn clear_template_cache(&self);
        async fn template_cache_statistics(&self) -> TemplateCacheStatistics;
    }
}
