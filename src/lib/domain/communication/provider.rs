//! Email delivery provider port
//!
//! The wire types mirror the provider's JSON API; the client trait is what the
//! primary channel talks to.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::{
    email_addresses::EmailAddress,
    errors::EmailError,
    mailer::{EmailMessage, EmailStatus},
};

/// Attachment as sent on the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttachment {
    /// Base64 encoded bytes
    pub content: String,

    /// File name
    pub filename: String,

    /// MIME type
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// Tag as sent on the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTag {
    /// Tag name
    pub name: String,

    /// Tag value
    pub value: String,
}

/// Body of a send request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailRequest {
    /// Sender, `Name <address>` or a bare address
    pub from: String,

    /// Recipients
    pub to: Vec<String>,

    /// Carbon copy recipients
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,

    /// Blind carbon copy recipients
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,

    /// Subject line
    pub subject: String,

    /// HTML body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Plain text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Attachments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<WireAttachment>,

    /// Analytics tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<WireTag>,
}

impl SendEmailRequest {
    /// Builds the wire request for `message` with already rendered bodies
    pub fn from_message(
        from: &str,
        message: &EmailMessage,
        subject: &str,
        html: Option<String>,
        text: Option<String>,
    ) -> Self {
        Self {
            from: from.to_string(),
            to: addresses(message.to()),
            cc: addresses(message.cc()),
            bcc: addresses(message.bcc()),
            subject: subject.to_string(),
            html,
            text,
            attachments: message
                .attachments()
                .iter()
                .map(|attachment| WireAttachment {
                    content: attachment.content_base64(),
                    filename: attachment.filename().to_string(),
                    content_type: attachment.content_type().to_string(),
                })
                .collect(),
            tags: message
                .metadata()
                .tags
                .iter()
                .map(|tag| WireTag {
                    name: tag.name.clone(),
                    value: tag.value.clone(),
                })
                .collect(),
        }
    }
}

fn addresses(list: &[EmailAddress]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

/// Body of a successful send response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailResponse {
    /// Provider message id
    pub id: String,

    /// Sender as recorded by the provider
    #[serde(default)]
    pub from: Option<String>,

    /// Recipients as recorded by the provider
    #[serde(default)]
    pub to: Vec<String>,

    /// Creation time reported by the provider
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Sending limits reported by the provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaInfo {
    /// Requests allowed per window
    pub limit: Option<u64>,

    /// Requests left in the current window
    pub remaining: Option<u64>,

    /// Seconds until the window resets
    pub reset_seconds: Option<u64>,
}

/// What the client last saw of the provider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No request made yet
    #[default]
    Unknown,

    /// Last request got a successful response
    Connected,

    /// Last request got an error status
    Error(u16),

    /// Last request never got a response
    Disconnected,
}

/// Low-level client for the delivery provider. Does not retry.
#[async_trait]
pub trait EmailProviderClient: Send + Sync + 'static {
    /// Submit one email
    async fn send(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, EmailError>;

    /// Whether the configured API key is accepted
    async fn validate_credentials(&self) -> Result<bool, EmailError>;

    /// Delivery state of a previously sent email
    async fn delivery_status(&self, provider_message_id: &str) -> Result<EmailStatus, EmailError>;

    /// Current sending limits
    async fn quota(&self) -> Result<QuotaInfo, EmailError>;

    /// Round trip of the last request
    fn last_response_time(&self) -> Option<Duration>;

    /// Outcome of the last request
    fn connection_status(&self) -> ConnectionStatus;
}

#[cfg(test)]
mock! {
    pub EmailProviderClient {}

    #[async_trait]
    impl EmailProviderClient for EmailProviderClient {
        async fn send(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, EmailError>;
        async fn validate_credentials(&self) -> Result<bool, EmailError>;
        async fn delivery_status(&self, provider_message_id: &str) -> Result<EmailStatus, EmailError>;
        async fn quota(&self) -> Result<QuotaInfo, EmailError>;
        fn last_response_time(&self) -> Option<Duration>;
        fn connection_status(&self) -> ConnectionStatus;
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::mailer::{Attachment, EmailContent};

    use super::*;

    #[test]
    fn test_request_json_shape() -> TestResult {
        let message = EmailMessage::builder(
            "Report",
            EmailContent::Text {
                body: "see attached".into(),
            },
        )
        .to(EmailAddress::new("user@example.com")?)
        .attachment(Attachment::new("r.csv", "text/csv", b"a,b".to_vec())?)
        .tag("category", "report")
        .build();

        let request = SendEmailRequest::from_message(
            "Acme <noreply@acme.test>",
            &message,
            "Report",
            None,
            Some("see attached".into()),
        );

        let json = serde_json::to_value(&request)?;

        assert_eq!(
            json,
            serde_json::json!({
                "from": "Acme <noreply@acme.test>",
                "to": ["user@example.com"],
                "subject": "Report",
                "text": "see attached",
                "attachments": [{"content": "YSxi", "filename": "r.csv", "contentType": "text/csv"}],
                "tags": [{"name": "category", "value": "report"}],
            })
        );

        Ok(())
    }

    #[test]
    fn test_response_tolerates_missing_fields() -> TestResult {
        let response: SendEmailResponse = serde_json::from_str(r#"{"id":"49a3999c"}"#)?;

        assert_eq!(response.id, "49a3999c");
        assert!(response.to.is_empty());

        Ok(())
    }
}
