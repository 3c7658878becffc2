//! Per-channel health and statistics

use std::{
    sync::{PoisonError, RwLock},
    time::Duration,
};

use chrono::{NaiveDate, Utc};

use crate::domain::communication::{
    errors::{EmailError, ErrorSeverity},
    mailer::{ChannelMetrics, EmailChannel, ServiceHealthStatus},
};

#[derive(Debug, Default)]
struct StateData {
    health: ServiceHealthStatus,
    total_sent: u64,
    sent_today: u64,
    today: Option<NaiveDate>,
    total_failed: u64,
    consecutive_failures: u32,
    last_success_at: Option<chrono::DateTime<Utc>>,
    last_failure_at: Option<chrono::DateTime<Utc>>,
    last_error: Option<String>,
    timed_sends: u64,
    average_response_time_ms: Option<f64>,
}

/// Health and counters of one channel, shared by concurrent sends.
///
/// The lock is never held across an await.
#[derive(Debug)]
pub struct ChannelState {
    channel: EmailChannel,
    data: RwLock<StateData>,
}

impl ChannelState {
    /// Fresh state with the given initial health
    pub fn new(channel: EmailChannel, health: ServiceHealthStatus) -> Self {
        Self {
            channel,
            data: RwLock::new(StateData {
                health,
                ..StateData::default()
            }),
        }
    }

    /// Current health
    pub fn health(&self) -> ServiceHealthStatus {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .health
    }

    /// Overrides the health, e.g. after a probe
    pub fn set_health(&self, health: ServiceHealthStatus) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .health = health;
    }

    /// Counts a successful send. A disabled channel stays disabled.
    pub fn record_success(&self, response_time: Option<Duration>) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        let today = now.date_naive();

        if data.today != Some(today) {
            data.today = Some(today);
            data.sent_today = 0;
        }

        data.total_sent += 1;
        data.sent_today += 1;
        data.consecutive_failures = 0;
        data.last_success_at = Some(now);

        if let Some(elapsed) = response_time {
            let sample = elapsed.as_secs_f64() * 1000.0;
            data.timed_sends += 1;

            #[allow(clippy::cast_precision_loss)]
            let count = data.timed_sends as f64;
            let average = data.average_response_time_ms.unwrap_or(0.0);
            data.average_response_time_ms = Some(average + (sample - average) / count);
        }

        if data.health != ServiceHealthStatus::Disabled {
            data.health = ServiceHealthStatus::Healthy;
        }
    }

    /// Counts a failed send and degrades health by the error's severity
    pub fn record_failure(&self, err: &EmailError) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        data.total_failed += 1;
        data.consecutive_failures = data.consecutive_failures.saturating_add(1);
        data.last_failure_at = Some(Utc::now());
        data.last_error = Some(err.to_string());

        if err.severity() == ErrorSeverity::Critical {
            data.health = ServiceHealthStatus::Disabled;
        } else if err.triggers_fallback() && data.health != ServiceHealthStatus::Disabled {
            data.health = ServiceHealthStatus::Degraded;
        }
    }

    /// Statistics snapshot
    pub fn metrics(&self) -> ChannelMetrics {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let sent_today = if data.today == Some(Utc::now().date_naive()) {
            data.sent_today
        } else {
            0
        };

        ChannelMetrics {
            channel: self.channel,
            health: data.health,
            total_sent: data.total_sent,
            sent_today,
            total_failed: data.total_failed,
            consecutive_failures: data.consecutive_failures,
            last_success_at: data.last_success_at,
            last_failure_at: data.last_failure_at,
            last_error: data.last_error.clone(),
            average_response_time_ms: data.average_response_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_restores_health_and_resets_streak() {
        let state = ChannelState::new(EmailChannel::Primary, ServiceHealthStatus::Unknown);

        state.record_failure(&EmailError::TimeoutError);
        assert_eq!(state.health(), ServiceHealthStatus::Degraded);
        assert_eq!(state.metrics().consecutive_failures, 1);

        state.record_success(Some(Duration::from_millis(40)));

        let metrics = state.metrics();
        assert_eq!(metrics.health, ServiceHealthStatus::Healthy);
        assert_eq!(metrics.consecutive_failures, 0);
        assert_eq!(metrics.total_sent, 1);
        assert_eq!(metrics.sent_today, 1);
        assert_eq!(metrics.total_failed, 1);
    }

    #[test]
    fn test_critical_failure_disables() {
        let state = ChannelState::new(EmailChannel::Primary, ServiceHealthStatus::Healthy);

        state.record_failure(&EmailError::AuthenticationFailed);
        assert_eq!(state.health(), ServiceHealthStatus::Disabled);

        state.record_success(None);
        assert_eq!(state.health(), ServiceHealthStatus::Disabled);
    }

    #[test]
    fn test_content_failure_keeps_health() {
        let state = ChannelState::new(EmailChannel::Fallback, ServiceHealthStatus::Healthy);

        state.record_failure(&EmailError::TemplateVariableMissing("user_name".into()));

        let metrics = state.metrics();
        assert_eq!(metrics.health, ServiceHealthStatus::Healthy);
        assert_eq!(metrics.last_error.as_deref(), Some("template variable \"user_name\" is missing"));
    }

    #[test]
    fn test_average_response_time() {
        let state = ChannelState::new(EmailChannel::Primary, ServiceHealthStatus::Unknown);

        state.record_success(Some(Duration::from_millis(100)));
        state.record_success(Some(Duration::from_millis(300)));
        state.record_success(None);

        let average = state.metrics().average_response_time_ms.unwrap_or_default();
        assert!((average - 200.0).abs() < 1e-6);
        assert_eq!(state.metrics().total_sent, 3);
    }
}
