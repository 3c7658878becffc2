//! Aggregated health and metrics snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::communication::mailer::{ChannelMetrics, EmailChannel, ServiceHealthStatus};

/// Overall status from the two channel statuses.
///
/// Healthy needs a healthy primary; a healthy fallback alone is degraded.
pub fn overall_health(
    primary: ServiceHealthStatus,
    fallback: ServiceHealthStatus,
) -> ServiceHealthStatus {
    if primary == ServiceHealthStatus::Healthy {
        ServiceHealthStatus::Healthy
    } else if fallback == ServiceHealthStatus::Healthy {
        ServiceHealthStatus::Degraded
    } else {
        ServiceHealthStatus::Unhealthy
    }
}

/// Result of probing both channels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Aggregate status
    pub overall: ServiceHealthStatus,

    /// Primary channel status
    pub primary: ServiceHealthStatus,

    /// Fallback channel status
    pub fallback: ServiceHealthStatus,

    /// Channel the next send would use
    pub active_channel: EmailChannel,

    /// When the probes finished
    pub checked_at: DateTime<Utc>,
}

/// Dispatcher statistics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchMetrics {
    /// Sends completed by the primary channel
    pub primary_sent: u64,

    /// Sends completed by the fallback channel
    pub fallback_sent: u64,

    /// Sends re-routed from one channel to the other
    pub fallback_activations: u64,

    /// Channel failures counted by the selector
    pub total_failures: u64,

    /// Channel the next send would use
    pub active_channel: EmailChannel,

    /// Pinned channel, if selection is manual
    pub manual_override: Option<EmailChannel>,

    /// Aggregate of the last known channel statuses
    pub overall_health: ServiceHealthStatus,

    /// Primary channel statistics
    pub primary: ChannelMetrics,

    /// Fallback channel statistics
    pub fallback: ChannelMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    use ServiceHealthStatus::*;

    #[test]
    fn test_overall_health() {
        assert_eq!(overall_health(Healthy, Unhealthy), Healthy);
        assert_eq!(overall_health(Degraded, Healthy), Degraded);
        assert_eq!(overall_health(Disabled, Healthy), Degraded);
        assert_eq!(overall_health(Degraded, Degraded), Unhealthy);
        assert_eq!(overall_health(Unknown, Unknown), Unhealthy);
    }
}
