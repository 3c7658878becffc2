//! Send outcomes

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the two delivery channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailChannel {
    /// Third-party delivery provider
    Primary,

    /// Auth backend based channel
    Fallback,
}

impl EmailChannel {
    /// The channel to fail over to
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Fallback,
            Self::Fallback => Self::Primary,
        }
    }
}

impl fmt::Display for EmailChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Delivery state of a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    /// Accepted, not yet handed over
    Pending,

    /// Handed to the provider
    Sent,

    /// Reached the recipient's server
    Delivered,

    /// Could not be sent
    Failed,

    /// Recipient server bounced it
    Bounced,

    /// Provider refused it
    Rejected,
}

/// Timing details of a completed send
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMetadata {
    /// Attempts made, including the successful one
    pub attempt_count: u32,

    /// When the last attempt was made
    pub last_attempt_at: DateTime<Utc>,

    /// When the message is expected in the inbox
    pub estimated_delivery_at: Option<DateTime<Utc>>,

    /// Provider round trip of the last attempt, in milliseconds
    pub provider_response_time_ms: Option<u64>,
}

/// Outcome of a send
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailResult {
    /// Id of the message that was sent
    pub id: Uuid,

    /// Channel that produced this result
    pub channel: EmailChannel,

    /// Delivery state
    pub status: EmailStatus,

    /// When the message was handed over
    pub sent_at: Option<DateTime<Utc>>,

    /// Id assigned by the provider
    pub provider_message_id: Option<String>,

    /// Failure description
    pub error: Option<String>,

    /// Timing details
    pub delivery: Option<DeliveryMetadata>,
}

impl EmailResult {
    /// A message that was handed over successfully
    pub fn sent(
        id: Uuid,
        channel: EmailChannel,
        provider_message_id: Option<String>,
        delivery: DeliveryMetadata,
    ) -> Self {
        Self {
            id,
            channel,
            status: EmailStatus::Sent,
            sent_at: Some(delivery.last_attempt_at),
            provider_message_id,
            error: None,
            delivery: Some(delivery),
        }
    }

    /// Whether the message left this system
    pub fn is_successful(&self) -> bool {
        matches!(self.status, EmailStatus::Sent | EmailStatus::Delivered)
    }
}
