//! Orchestrates sends across both channels

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::domain::communication::{
    email_addresses::EmailAddress,
    errors::EmailError,
    mailer::{
        EmailChannel, EmailChannelService, EmailMessage, EmailRequest, EmailResult, EmailService,
        ServiceHealthStatus,
    },
    templates::{TemplateCacheStatistics, TemplateEngine},
};

use super::{
    metrics::{overall_health, DispatchMetrics, HealthReport},
    selector::{is_usable, EmailServiceSelector},
    EmailDispatch,
};

/// Sends through the selected channel and re-routes failures to the other
/// one when the selector says so.
///
/// The caller only ever sees the terminal outcome: the first channel's error
/// is swallowed when the other channel produced a result.
pub struct EmailDispatcher<P, F>
where
    P: EmailChannelService,
    F: EmailChannelService,
{
    primary: P,
    fallback: F,
    selector: EmailServiceSelector,
    templates: Arc<TemplateEngine>,
}

impl<P, F> fmt::Debug for EmailDispatcher<P, F>
where
    P: EmailChannelService,
    F: EmailChannelService,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailDispatcher")
            .field("primary", &self.primary.channel())
            .field("fallback", &self.fallback.channel())
            .field("selector", &self.selector)
            .field("templates", &self.templates)
            .finish()
    }
}

impl<P, F> EmailDispatcher<P, F>
where
    P: EmailChannelService,
    F: EmailChannelService,
{
    /// Creates a dispatcher over both channels
    pub fn new(
        primary: P,
        fallback: F,
        selector: EmailServiceSelector,
        templates: Arc<TemplateEngine>,
    ) -> Self {
        Self {
            primary,
            fallback,
            selector,
            templates,
        }
    }

    /// Issues `request` on the selected channel, failing over when allowed
    #[instrument(skip_all, fields(kind = request.kind()))]
    pub async fn dispatch(&self, request: EmailRequest) -> Result<EmailResult, EmailError> {
        request.validate()?;

        let channel = self
            .selector
            .select(self.primary.health_status(), self.fallback.health_status())?;

        let err = match self.send_on(channel, &request).await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        if !self.selector.should_fallback(channel, &err) {
            return Err(err);
        }

        let other = channel.other();

        if !is_usable(self.health_of(other)) {
            warn!(%channel, %other, error = %err, "no channel left to fail over to");

            return Err(EmailError::AllServicesUnavailable);
        }

        self.selector.record_fallback_activation();

        warn!(from = %channel, to = %other, error = %err, "failing over to the other channel");

        self.send_on(other, &request).await
    }

    /// Pins sends to the primary channel
    pub fn switch_to_primary_service(&self) {
        self.selector.set_manual_override(Some(EmailChannel::Primary));
    }

    /// Pins sends to the fallback channel
    pub fn switch_to_fallback_service(&self) {
        self.selector.set_manual_override(Some(EmailChannel::Fallback));
    }

    /// Returns to automatic channel selection
    pub fn use_automatic_selection(&self) {
        self.selector.set_manual_override(None);
    }

    async fn send_on(
        &self,
        channel: EmailChannel,
        request: &EmailRequest,
    ) -> Result<EmailResult, EmailError> {
        let outcome = match channel {
            EmailChannel::Primary => request.send_via(&self.primary).await,
            EmailChannel::Fallback => request.send_via(&self.fallback).await,
        };

        match &outcome {
            Ok(result) => {
                self.selector.record_success(channel);

                info!(%channel, email_id = %result.id, "email dispatched");
            }
            Err(err) => self.selector.record_failure(channel, err),
        }

        outcome
    }

    fn health_of(&self, channel: EmailChannel) -> ServiceHealthStatus {
        match channel {
            EmailChannel::Primary => self.primary.health_status(),
            EmailChannel::Fallback => self.fallback.health_status(),
        }
    }
}

#[async_trait]
impl<P, F> EmailService for EmailDispatcher<P, F>
where
    P: EmailChannelService,
    F: EmailChannelService,
{
    async fn send_email(&self, message: &EmailMessage) -> Result<EmailResult, EmailError> {
        self.dispatch(EmailRequest::Message(message.clone())).await
    }

    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        reset_token: &str,
    ) -> Result<EmailResult, EmailError> {
        self.dispatch(EmailRequest::PasswordReset {
            to: to.clone(),
            reset_token: reset_token.to_string(),
        })
        .await
    }

    async fn send_welcome_email(
        &self,
        to: &EmailAddress,
        user_name: &str,
    ) -> Result<EmailResult, EmailError> {
        self.dispatch(EmailRequest::Welcome {
            to: to.clone(),
            user_name: user_name.to_string(),
        })
        .await
    }

    async fn send_account_verification(
        &self,
        to: &EmailAddress,
        verification_token: &str,
    ) -> Result<EmailResult, EmailError> {
        self.dispatch(EmailRequest::AccountVerification {
            to: to.clone(),
            verification_token: verification_token.to_string(),
        })
        .await
    }

    async fn send_follow_up_welcome_email(
        &self,
        to: &EmailAddress,
        user_name: &str,
    ) -> Result<EmailResult, EmailError> {
        self.dispatch(EmailRequest::FollowUpWelcome {
            to: to.clone(),
            user_name: user_name.to_string(),
        })
        .await
    }
}

#[async_trait]
impl<P, F> EmailDispatch for EmailDispatcher<P, F>
where
    P: EmailChannelService,
    F: EmailChannelService,
{
    fn switch_channel(&self, channel: Option<EmailChannel>) {
        match channel {
            Some(EmailChannel::Primary) => self.switch_to_primary_service(),
            Some(EmailChannel::Fallback) => self.switch_to_fallback_service(),
            None => self.use_automatic_selection(),
        }
    }

    async fn perform_health_check(&self) -> HealthReport {
        let (primary, fallback) =
            tokio::join!(self.primary.health_check(), self.fallback.health_check());

        let report = HealthReport {
            overall: overall_health(primary, fallback),
            primary,
            fallback,
            active_channel: self.selector.active_channel(primary, fallback),
            checked_at: Utc::now(),
        };

        info!(overall = ?report.overall, ?primary, ?fallback, "email health check finished");

        report
    }

    fn service_metrics(&self) -> DispatchMetrics {
        let primary = self.primary.metrics();
        let fallback = self.fallback.metrics();

        DispatchMetrics {
            primary_sent: primary.total_sent,
            fallback_sent: fallback.total_sent,
            fallback_activations: self.selector.fallback_activations(),
            total_failures: self.selector.total_failures(),
            active_channel: self.selector.active_channel(primary.health, fallback.health),
            manual_override: self.selector.manual_override(),
            overall_health: overall_health(primary.health, fallback.health),
            primary,
            fallback,
        }
    }

    async fn clear_template_cache(&self) {
        self.templates.clear_cache().await;
    }

    async fn template_cache_statistics(&self) -> TemplateCacheStatistics {
        self.templates.cache_statistics().await
    }
}
