//! Channel selection and failover policy

use std::sync::{PoisonError, RwLock};

use tracing::info;

use crate::domain::communication::{
    errors::{EmailError, ErrorSeverity},
    mailer::{EmailChannel, ServiceHealthStatus},
};

/// When a failed send is re-routed to the other channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectorPolicy {
    /// Consecutive failures on a channel before its sends are re-routed.
    /// Critical failures re-route immediately.
    pub failure_threshold: u32,
}

impl Default for SelectorPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 1,
        }
    }
}

#[derive(Debug, Default)]
struct SelectorData {
    manual: Option<EmailChannel>,
    primary_failures: u32,
    fallback_failures: u32,
    fallback_activations: u64,
    total_failures: u64,
}

impl SelectorData {
    fn failures(&self, channel: EmailChannel) -> u32 {
        match channel {
            EmailChannel::Primary => self.primary_failures,
            EmailChannel::Fallback => self.fallback_failures,
        }
    }

    fn failures_mut(&mut self, channel: EmailChannel) -> &mut u32 {
        match channel {
            EmailChannel::Primary => &mut self.primary_failures,
            EmailChannel::Fallback => &mut self.fallback_failures,
        }
    }
}

/// Whether a channel in this state may be handed a send.
///
/// Unprobed channels are given the benefit of the doubt.
pub fn is_usable(health: ServiceHealthStatus) -> bool {
    health == ServiceHealthStatus::Unknown || health.can_send_emails()
}

/// Decides which channel handles a send and when to fail over
#[derive(Debug)]
pub struct EmailServiceSelector {
    policy: SelectorPolicy,
    data: RwLock<SelectorData>,
}

impl Default for EmailServiceSelector {
    fn default() -> Self {
        Self::new(SelectorPolicy::default())
    }
}

impl EmailServiceSelector {
    /// Creates a selector in automatic mode
    pub fn new(policy: SelectorPolicy) -> Self {
        Self {
            policy,
            data: RwLock::new(SelectorData::default()),
        }
    }

    /// Channel for the next send.
    ///
    /// A manual override always wins. Otherwise the primary is preferred
    /// while usable, then the fallback.
    pub fn select(
        &self,
        primary: ServiceHealthStatus,
        fallback: ServiceHealthStatus,
    ) -> Result<EmailChannel, EmailError> {
        if let Some(channel) = self.manual_override() {
            return Ok(channel);
        }

        if is_usable(primary) {
            Ok(EmailChannel::Primary)
        } else if is_usable(fallback) {
            Ok(EmailChannel::Fallback)
        } else {
            Err(EmailError::AllServicesUnavailable)
        }
    }

    /// Channel that would handle a send right now
    pub fn active_channel(
        &self,
        primary: ServiceHealthStatus,
        fallback: ServiceHealthStatus,
    ) -> EmailChannel {
        self.select(primary, fallback)
            .unwrap_or(EmailChannel::Primary)
    }

    /// Whether a send that failed on `channel` with `err` goes to the other channel
    pub fn should_fallback(&self, channel: EmailChannel, err: &EmailError) -> bool {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);

        if data.manual.is_some() || !err.triggers_fallback() {
            return false;
        }

        err.severity() == ErrorSeverity::Critical
            || data.failures(channel) >= self.policy.failure_threshold
    }

    /// Resets the failure streak of `channel`
    pub fn record_success(&self, channel: EmailChannel) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        *data.failures_mut(channel) = 0;
    }

    /// Extends the failure streak of `channel`. Validation errors are the
    /// caller's fault and are not counted.
    pub fn record_failure(&self, channel: EmailChannel, err: &EmailError) {
        if err.is_validation_error() {
            return;
        }

        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        let failures = data.failures_mut(channel);
        *failures = failures.saturating_add(1);
        data.total_failures += 1;
    }

    /// Counts a send re-routed to the other channel
    pub fn record_fallback_activation(&self) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fallback_activations += 1;
    }

    /// Pins every send to `channel`, or returns to automatic selection with `None`
    pub fn set_manual_override(&self, channel: Option<EmailChannel>) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .manual = channel;

        match channel {
            Some(channel) => info!(%channel, "email channel pinned manually"),
            None => info!("email channel selection is automatic"),
        }
    }

    /// The pinned channel, if any
    pub fn manual_override(&self) -> Option<EmailChannel> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .manual
    }

    /// Consecutive counted failures on `channel`
    pub fn consecutive_failures(&self, channel: EmailChannel) -> u32 {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .failures(channel)
    }

    /// Sends re-routed to the other channel since start
    pub fn fallback_activations(&self) -> u64 {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fallback_activations
    }

    /// Counted failures on either channel since start
    pub fn total_failures(&self) -> u64 {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .total_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ServiceHealthStatus::*;

    #[test]
    fn test_prefers_usable_primary() {
        let selector = EmailServiceSelector::default();

        assert_eq!(selector.select(Unknown, Unknown), Ok(EmailChannel::Primary));
        assert_eq!(selector.select(Degraded, Healthy), Ok(EmailChannel::Primary));
        assert_eq!(selector.select(Disabled, Unknown), Ok(EmailChannel::Fallback));
        assert_eq!(
            selector.select(Unhealthy, Disabled),
            Err(EmailError::AllServicesUnavailable)
        );
    }

    #[test]
    fn test_manual_override_wins_and_stops_rerouting() {
        let selector = EmailServiceSelector::default();

        selector.set_manual_override(Some(EmailChannel::Fallback));
        selector.record_failure(EmailChannel::Fallback, &EmailError::TimeoutError);

        assert_eq!(selector.select(Healthy, Unhealthy), Ok(EmailChannel::Fallback));
        assert!(!selector.should_fallback(EmailChannel::Fallback, &EmailError::TimeoutError));

        selector.set_manual_override(None);

        assert_eq!(selector.active_channel(Healthy, Healthy), EmailChannel::Primary);
    }

    #[test]
    fn test_threshold_counts_consecutive_failures() {
        let selector = EmailServiceSelector::new(SelectorPolicy {
            failure_threshold: 3,
        });
        let err = EmailError::NetworkError("reset".into());

        for expected in [false, false, true] {
            selector.record_failure(EmailChannel::Primary, &err);
            assert_eq!(selector.should_fallback(EmailChannel::Primary, &err), expected);
        }

        selector.record_success(EmailChannel::Primary);

        assert_eq!(selector.consecutive_failures(EmailChannel::Primary), 0);
        assert_eq!(selector.total_failures(), 3);
    }

    #[test]
    fn test_critical_errors_reroute_immediately() {
        let selector = EmailServiceSelector::new(SelectorPolicy {
            failure_threshold: 5,
        });

        selector.record_failure(EmailChannel::Primary, &EmailError::AuthenticationFailed);

        assert!(selector.should_fallback(EmailChannel::Primary, &EmailError::AuthenticationFailed));
    }

    #[test]
    fn test_content_errors_never_reroute() {
        let selector = EmailServiceSelector::default();
        let validation = EmailError::EmptySubject;
        let template = EmailError::TemplateVariableMissing("user_name".into());

        selector.record_failure(EmailChannel::Primary, &validation);
        assert_eq!(selector.total_failures(), 0);
        assert!(!selector.should_fallback(EmailChannel::Primary, &validation));

        selector.record_failure(EmailChannel::Primary, &template);
        assert!(!selector.should_fallback(EmailChannel::Primary, &template));
    }
}
