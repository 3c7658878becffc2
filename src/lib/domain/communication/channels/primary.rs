//! Primary channel: the third-party delivery provider

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::domain::communication::{
    email_addresses::EmailAddress,
    errors::{EmailError, ErrorSeverity},
    mailer::{
        validate_message, ChannelMetrics, DeliveryMetadata, EmailChannel, EmailChannelService,
        EmailMessage, EmailResult, EmailService, EmailStatus, ServiceHealthStatus,
    },
    provider::{ConnectionStatus, EmailProviderClient, QuotaInfo, SendEmailRequest},
    templates::TemplateEngine,
};

use super::{prepare_content, retry::RetryPolicy, state::ChannelState};

/// What the primary channel needs besides its client
#[derive(Clone, Debug, PartialEq)]
pub struct PrimaryChannelSettings {
    /// Sender address
    pub from_address: String,

    /// Sender display name
    pub from_name: String,

    /// Base URL links in emails point at
    pub app_base_url: String,

    /// Retry behaviour for provider calls
    pub retry: RetryPolicy,

    /// Whether the provider credentials are usable at all
    pub configured: bool,
}

impl PrimaryChannelSettings {
    /// `Name <address>`, or the bare address without a name
    pub fn from_header(&self) -> String {
        if self.from_name.trim().is_empty() {
            self.from_address.clone()
        } else {
            format!("{} <{}>", self.from_name, self.from_address)
        }
    }
}

/// Sends through the delivery provider with bounded retries
pub struct PrimaryEmailService<C: EmailProviderClient> {
    client: C,
    templates: Arc<TemplateEngine>,
    settings: PrimaryChannelSettings,
    state: ChannelState,
}

impl<C: EmailProviderClient> fmt::Debug for PrimaryEmailService<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryEmailService")
            .field("client", &"EmailProviderClient")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .finish()
    }
}

impl<C: EmailProviderClient> PrimaryEmailService<C> {
    /// Creates the channel. An unconfigured channel starts disabled.
    pub fn new(client: C, templates: Arc<TemplateEngine>, settings: PrimaryChannelSettings) -> Self {
        let health = if settings.configured {
            ServiceHealthStatus::Unknown
        } else {
            warn!("primary email channel is not configured and starts disabled");
            ServiceHealthStatus::Disabled
        };

        Self {
            client,
            templates,
            settings,
            state: ChannelState::new(EmailChannel::Primary, health),
        }
    }

    /// Delivery state of a message sent earlier
    pub async fn delivery_status(&self, provider_message_id: &str) -> Result<EmailStatus, EmailError> {
        self.client.delivery_status(provider_message_id).await
    }

    /// Current sending limits
    pub async fn quota(&self) -> Result<QuotaInfo, EmailError> {
        self.client.quota().await
    }

    /// Outcome of the client's last request
    pub fn connection_status(&self) -> ConnectionStatus {
        self.client.connection_status()
    }

    fn ensure_available(&self) -> Result<(), EmailError> {
        if !self.settings.configured || self.state.health() == ServiceHealthStatus::Disabled {
            return Err(EmailError::PrimaryServiceUnavailable);
        }

        Ok(())
    }

    fn fail(&self, err: EmailError) -> EmailError {
        self.state.record_failure(&err);

        error!(error = %err, severity = ?err.severity(), "primary send failed");

        err
    }
}

#[async_trait]
impl<C: EmailProviderClient> EmailService for PrimaryEmailService<C> {
    #[instrument(skip_all, fields(channel = "primary", message_id = %message.id()))]
    async fn send_email(&self, message: &EmailMessage) -> Result<EmailResult, EmailError> {
        self.ensure_available()?;
        validate_message(message)?;

        let content = prepare_content(&self.templates, message)
            .await
            .map_err(|err| self.fail(err))?;

        let request = SendEmailRequest::from_message(
            &self.settings.from_header(),
            message,
            &content.subject,
            content.html,
            content.text,
        );

        let (outcome, attempts) = self
            .settings
            .retry
            .run(|_| self.client.send(&request))
            .await;

        let response = outcome.map_err(|err| self.fail(err))?;
        let response_time = self.client.last_response_time();

        self.state.record_success(response_time);

        info!(
            provider_message_id = %response.id,
            attempts,
            "email sent via primary channel"
        );

        Ok(EmailResult::sent(
            message.id(),
            EmailChannel::Primary,
            Some(response.id),
            DeliveryMetadata {
                attempt_count: attempts,
                last_attempt_at: Utc::now(),
                estimated_delivery_at: None,
                provider_response_time_ms: response_time.map(millis),
            },
        ))
    }

    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        reset_token: &str,
    ) -> Result<EmailResult, EmailError> {
        let message =
            EmailMessage::password_reset(to.clone(), &self.settings.app_base_url, reset_token);

        self.send_email(&message).await
    }

    async fn send_welcome_email(
        &self,
        to: &EmailAddress,
        user_name: &str,
    ) -> Result<EmailResult, EmailError> {
        self.send_email(&EmailMessage::welcome(to.clone(), user_name))
            .await
    }

    async fn send_account_verification(
        &self,
        to: &EmailAddress,
        verification_token: &str,
    ) -> Result<EmailResult, EmailError> {
        let message = EmailMessage::account_verification(
            to.clone(),
            &self.settings.app_base_url,
            verification_token,
        );

        self.send_email(&message).await
    }

    async fn send_follow_up_welcome_email(
        &self,
        to: &EmailAddress,
        user_name: &str,
    ) -> Result<EmailResult, EmailError> {
        self.send_email(&EmailMessage::follow_up_welcome(to.clone(), user_name))
            .await
    }
}

#[async_trait]
impl<C: EmailProviderClient> EmailChannelService for PrimaryEmailService<C> {
    fn channel(&self) -> EmailChannel {
        EmailChannel::Primary
    }

    #[instrument(skip_all, fields(channel = "primary"))]
    async fn health_check(&self) -> ServiceHealthStatus {
        if !self.settings.configured {
            return ServiceHealthStatus::Disabled;
        }

        let health = match self.client.validate_credentials().await {
            Ok(true) => ServiceHealthStatus::Healthy,
            Ok(false) => ServiceHealthStatus::Disabled,
            Err(err) if err.severity() == ErrorSeverity::Critical => ServiceHealthStatus::Disabled,
            Err(err) => {
                warn!(error = %err, "primary health check failed");
                ServiceHealthStatus::Unhealthy
            }
        };

        self.state.set_health(health);

        health
    }

    fn health_status(&self) -> ServiceHealthStatus {
        self.state.health()
    }

    fn metrics(&self) -> ChannelMetrics {
        self.state.metrics()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
