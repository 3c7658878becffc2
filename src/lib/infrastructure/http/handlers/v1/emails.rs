//! Account lifecycle email handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::communication::mailer::{EmailChannel, EmailResult, EmailStatus};

pub mod follow_up_welcome;
pub mod password_reset;
pub mod verification;
pub mod welcome;

/// Outcome of an accepted send
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmailSentResponse {
    /// Id of the message
    pub id: Uuid,

    /// Channel that handled the message
    #[schema(value_type = String, example = "primary")]
    pub channel: EmailChannel,

    /// Delivery state
    #[schema(value_type = String, example = "sent")]
    pub status: EmailStatus,

    /// Id assigned by the provider
    #[schema(example = "4ef9a417-02e9-4d39-ad75-9611e0fcc33c")]
    pub provider_message_id: Option<String>,

    /// When the message was handed over
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<EmailResult> for EmailSentResponse {
    fn from(result: EmailResult) -> Self {
        Self {
            id: result.id,
            channel: result.channel,
            status: result.status,
            provider_message_id: result.provider_message_id,
            sent_at: result.sent_at,
        }
    }
}
