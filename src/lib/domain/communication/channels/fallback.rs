//! Fallback channel: the authentication backend's own mailer

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    auth::AuthBackend,
    communication::{
        email_addresses::EmailAddress,
        errors::{EmailError, ErrorSeverity},
        mailer::{
            validate_message, ChannelMetrics, DeliveryMetadata, EmailChannel,
            EmailChannelService, EmailMessage, EmailResult, EmailService, ServiceHealthStatus,
        },
        templates::TemplateEngine,
    },
};

use super::{prepare_content, retry::RetryPolicy, state::ChannelState};

/// How long the backend usually takes to deliver a reset email
pub const FALLBACK_DELIVERY_ESTIMATE: Duration = Duration::from_secs(2 * 60);

/// What the fallback channel needs besides its backend
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackChannelSettings {
    /// Base URL links in emails point at
    pub app_base_url: String,

    /// Retry behaviour for backend calls
    pub retry: RetryPolicy,
}

impl FallbackChannelSettings {
    fn reset_redirect(&self) -> String {
        format!("{}/reset-password", self.app_base_url.trim_end_matches('/'))
    }
}

/// Sends password resets through the auth backend. Everything else is
/// rendered and logged, since the backend has no general purpose mailer.
pub struct FallbackEmailService<A: AuthBackend> {
    backend: A,
    templates: Arc<TemplateEngine>,
    settings: FallbackChannelSettings,
    state: ChannelState,
}

impl<A: AuthBackend> fmt::Debug for FallbackEmailService<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackEmailService")
            .field("backend", &"AuthBackend")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .finish()
    }
}

impl<A: AuthBackend> FallbackEmailService<A> {
    /// Creates the channel
    pub fn new(backend: A, templates: Arc<TemplateEngine>, settings: FallbackChannelSettings) -> Self {
        Self {
            backend,
            templates,
            settings,
            state: ChannelState::new(EmailChannel::Fallback, ServiceHealthStatus::Unknown),
        }
    }

    fn fail(&self, err: EmailError) -> EmailError {
        self.state.record_failure(&err);

        error!(error = %err, severity = ?err.severity(), "fallback send failed");

        err
    }

    fn delivered(&self, message: &EmailMessage, attempts: u32, elapsed: Duration) -> EmailResult {
        self.state.record_success(Some(elapsed));

        let now = Utc::now();

        EmailResult::sent(
            message.id(),
            EmailChannel::Fallback,
            Some(format!("fallback-{}", Uuid::now_v7())),
            DeliveryMetadata {
                attempt_count: attempts,
                last_attempt_at: now,
                estimated_delivery_at: chrono::Duration::from_std(FALLBACK_DELIVERY_ESTIMATE)
                    .ok()
                    .map(|estimate| now + estimate),
                provider_response_time_ms: u64::try_from(elapsed.as_millis()).ok(),
            },
        )
    }
}

#[async_trait]
impl<A: AuthBackend> EmailService for FallbackEmailService<A> {
    #[instrument(skip_all, fields(channel = "fallback", message_id = %message.id()))]
    async fn send_email(&self, message: &EmailMessage) -> Result<EmailResult, EmailError> {
        validate_message(message)?;

        let started = Instant::now();
        let content = prepare_content(&self.templates, message)
            .await
            .map_err(|err| self.fail(err))?;

        info!(
            recipients = message.to().len(),
            subject = %content.subject,
            "fallback channel accepted email for simulated delivery"
        );

        Ok(self.delivered(message, 1, started.elapsed()))
    }

    #[instrument(skip_all, fields(channel = "fallback"))]
    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        reset_token: &str,
    ) -> Result<EmailResult, EmailError> {
        let message =
            EmailMessage::password_reset(to.clone(), &self.settings.app_base_url, reset_token);
        validate_message(&message)?;

        let redirect = self.settings.reset_redirect();
        let redirect_to = redirect.as_str();
        let backend = &self.backend;
        let started = Instant::now();

        let (outcome, attempts) = self
            .settings
            .retry
            .run(move |_| async move {
                backend
                    .send_password_reset(to, redirect_to)
                    .await
                    .map_err(EmailError::from)
            })
            .await;

        outcome.map_err(|err| self.fail(err))?;

        info!(attempts, "password reset sent via auth backend");

        Ok(self.delivered(&message, attempts, started.elapsed()))
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
impl<A: AuthBackend> EmailChannelService for FallbackEmailService<A> {
    fn channel(&self) -> EmailChannel {
        EmailChannel::Fallback
    }

    #[instrument(skip_all, fields(channel = "fallback"))]
    async fn health_check(&self) -> ServiceHealthStatus {
        let health = match self.backend.health_check().await {
            Ok(()) => ServiceHealthStatus::Healthy,
            Err(err) => {
                warn!(error = %err, "fallback health check failed");

                if EmailError::from(err).severity() == ErrorSeverity::Critical {
                    ServiceHealthStatus::Disabled
                } else {
                    ServiceHealthStatus::Unhealthy
                }
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
