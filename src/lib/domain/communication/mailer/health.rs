//! Channel health and statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::EmailChannel;

/// Coarse operational state of a channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceHealthStatus {
    /// Not checked yet
    #[default]
    Unknown,

    /// Working normally
    Healthy,

    /// Working, with recent failures
    Degraded,

    /// Failing
    Unhealthy,

    /// Switched off, by configuration or a critical failure
    Disabled,
}

impl ServiceHealthStatus {
    /// Whether sends should be attempted on a channel in this state
    pub fn can_send_emails(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }
}

/// Point-in-time statistics of one channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    /// Which channel
    pub channel: EmailChannel,

    /// Current health
    pub health: ServiceHealthStatus,

    /// Successful sends since start
    pub total_sent: u64,

    /// Successful sends today (UTC)
    pub sent_today: u64,

    /// Failed sends since start
    pub total_failed: u64,

    /// Failures since the last success
    pub consecutive_failures: u32,

    /// Time of the last success
    pub last_success_at: Option<DateTime<Utc>>,

    /// Time of the last failure
    pub last_failure_at: Option<DateTime<Utc>>,

    /// Last failure description
    pub last_error: Option<String>,

    /// Mean provider round trip of successful sends, in milliseconds
    pub average_response_time_ms: Option<f64>,
}
