//! Email message

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::communication::{
    email_addresses::EmailAddress,
    templates::{EmailTemplate, TemplateId},
};

use super::attachment::Attachment;

/// The body of an email
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmailContent {
    /// Plain text only
    Text {
        /// Body
        body: String,
    },

    /// HTML only
    Html {
        /// Body
        body: String,
    },

    /// A named template, rendered by the sending channel
    Template {
        /// Which template
        id: TemplateId,
        /// Values for the template's placeholders
        variables: BTreeMap<String, String>,
    },
}

/// Delivery priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailPriority {
    /// Bulk, can wait
    Low,

    /// Default
    #[default]
    Normal,

    /// User is waiting on it
    High,

    /// Security relevant
    Urgent,
}

/// A name/value pair forwarded to the provider for analytics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTag {
    /// Tag name
    pub name: String,

    /// Tag value
    pub value: String,
}

impl EmailTag {
    /// Creates a new tag
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Delivery options attached to a message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMetadata {
    /// Delivery priority
    pub priority: EmailPriority,

    /// Ask the recipient's client for a read receipt
    pub request_read_receipt: bool,

    /// Send no earlier than this
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Provider analytics tags
    pub tags: Vec<EmailTag>,

    /// Track opens
    pub track_opens: bool,

    /// Track link clicks
    pub track_clicks: bool,
}

/// Email message
///
/// Built once and never mutated; semantic validation happens in the channel
/// that sends it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    id: Uuid,
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    bcc: Vec<EmailAddress>,
    subject: String,
    content: EmailContent,
    attachments: Vec<Attachment>,
    metadata: EmailMetadata,
    created_at: DateTime<Utc>,
}

impl EmailMessage {
    /// Starts building a message
    pub fn builder(subject: impl Into<String>, content: EmailContent) -> EmailMessageBuilder {
        EmailMessageBuilder {
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            content,
            attachments: Vec::new(),
            metadata: EmailMetadata::default(),
        }
    }

    /// A templated message for one of the standard flows
    pub fn from_template(to: EmailAddress, template: &EmailTemplate) -> Self {
        let priority = match template {
            EmailTemplate::PasswordReset { .. } => EmailPriority::Urgent,
            EmailTemplate::AccountVerification { .. } => EmailPriority::High,
            EmailTemplate::Welcome { .. } | EmailTemplate::FollowUpWelcome { .. } => {
                EmailPriority::Normal
            }
        };

        let content = EmailContent::Template {
            id: template.id(),
            variables: template.variables(&to),
        };

        Self::builder(template.default_subject(), content)
            .to(to)
            .priority(priority)
            .tag("category", template.id().as_str())
            .build()
    }

    /// Password reset message
    pub fn password_reset(to: EmailAddress, base_url: &str, token: &str) -> Self {
        Self::from_template(to, &EmailTemplate::password_reset(base_url, token))
    }

    /// Welcome message
    pub fn welcome(to: EmailAddress, user_name: &str) -> Self {
        Self::from_template(
            to,
            &EmailTemplate::Welcome {
                user_name: user_name.to_string(),
            },
        )
    }

    /// Account verification message
    pub fn account_verification(to: EmailAddress, base_url: &str, token: &str) -> Self {
        Self::from_template(to, &EmailTemplate::account_verification(base_url, token))
    }

    /// Follow-up welcome message
    pub fn follow_up_welcome(to: EmailAddress, user_name: &str) -> Self {
        Self::from_template(
            to,
            &EmailTemplate::FollowUpWelcome {
                user_name: user_name.to_string(),
            },
        )
    }

    /// Unique message id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Primary recipients
    pub fn to(&self) -> &[EmailAddress] {
        &self.to
    }

    /// Carbon copy recipients
    pub fn cc(&self) -> &[EmailAddress] {
        &self.cc
    }

    /// Blind carbon copy recipients
    pub fn bcc(&self) -> &[EmailAddress] {
        &self.bcc
    }

    /// Subject line
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Body
    pub fn content(&self) -> &EmailContent {
        &self.content
    }

    /// Attachments
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Delivery options
    pub fn metadata(&self) -> &EmailMetadata {
        &self.metadata
    }

    /// When the message was built
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Assembles an [`EmailMessage`]
#[derive(Debug)]
pub struct EmailMessageBuilder {
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    bcc: Vec<EmailAddress>,
    subject: String,
    content: EmailContent,
    attachments: Vec<Attachment>,
    metadata: EmailMetadata,
}

impl EmailMessageBuilder {
    /// Adds a recipient
    pub fn to(mut self, address: EmailAddress) -> Self {
        self.to.push(address);
        self
    }

    /// Adds a carbon copy recipient
    pub fn cc(mut self, address: EmailAddress) -> Self {
        self.cc.push(address);
        self
    }

    /// Adds a blind carbon copy recipient
    pub fn bcc(mut self, address: EmailAddress) -> Self {
        self.bcc.push(address);
        self
    }

    /// Adds an attachment
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Sets the priority
    pub fn priority(mut self, priority: EmailPriority) -> Self {
        self.metadata.priority = priority;
        self
    }

    /// Adds an analytics tag
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.tags.push(EmailTag::new(name, value));
        self
    }

    /// Schedules the message
    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.scheduled_at = Some(at);
        self
    }

    /// Requests a read receipt
    pub fn request_read_receipt(mut self) -> Self {
        self.metadata.request_read_receipt = true;
        self
    }

    /// Enables open and click tracking
    pub fn tracking(mut self, opens: bool, clicks: bool) -> Self {
        self.metadata.track_opens = opens;
        self.metadata.track_clicks = clicks;
        self
    }

    /// Freezes the message
    pub fn build(self) -> EmailMessage {
        EmailMessage {
            id: Uuid::now_v7(),
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            subject: self.subject,
            content: self.content,
            attachments: self.attachments,
            metadata: self.metadata,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_message() {
        let to = EmailAddress::new_unchecked("user@example.com");
        let message = EmailMessage::password_reset(to.clone(), "https://example.com", "token");

        assert_eq!(message.to(), &[to]);
        assert_eq!(message.subject(), "Reset your password");
        assert_eq!(message.metadata().priority, EmailPriority::Urgent);
        assert_eq!(
            message.metadata().tags,
            vec![EmailTag::new("category", "password_reset")]
        );

        let EmailContent::Template { id, variables } = message.content() else {
            panic!("expected template content");
        };

        assert_eq!(*id, TemplateId::PasswordReset);
        assert_eq!(
            variables.get("reset_url").map(String::as_str),
            Some("https://example.com/reset-password?token=token")
        );
    }

    #[test]
    fn test_builder_collects_recipients_and_options() {
        let message = EmailMessage::builder(
            "Invoice",
            EmailContent::Text {
                body: "attached".into(),
            },
        )
        .to(EmailAddress::new_unchecked("a@example.com"))
        .cc(EmailAddress::new_unchecked("b@example.com"))
        .bcc(EmailAddress::new_unchecked("c@example.com"))
        .request_read_receipt()
        .tracking(true, false)
        .build();

        assert_eq!(message.to().len(), 1);
        assert_eq!(message.cc().len(), 1);
        assert_eq!(message.bcc().len(), 1);
        assert!(message.metadata().request_read_receipt);
        assert!(message.metadata().track_opens);
        assert!(!message.metadata().track_clicks);
    }

    #[test]
    fn test_every_message_gets_its_own_id() {
        let a = EmailMessage::welcome(EmailAddress::new_unchecked("a@example.com"), "A");
        let b = EmailMessage::welcome(EmailAddress::new_unchecked("a@example.com"), "A");

        assert_ne!(a.id(), b.id());
    }
}
