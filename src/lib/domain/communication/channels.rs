//! Delivery channels

use crate::domain::communication::{
    errors::EmailError,
    mailer::{EmailContent, EmailMessage},
    templates::TemplateEngine,
};

mod fallback;
mod primary;
mod retry;
mod state;

pub use fallback::{FallbackChannelSettings, FallbackEmailService, FALLBACK_DELIVERY_ESTIMATE};
pub use primary::{PrimaryChannelSettings, PrimaryEmailService};
pub use retry::RetryPolicy;
pub use state::ChannelState;

/// Subject and bodies ready to hand to a transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedContent {
    /// Subject line
    pub subject: String,

    /// HTML body
    pub html: Option<String>,

    /// Plain text body
    pub text: Option<String>,
}

/// Resolves the message content, rendering templates through `templates`
pub async fn prepare_content(
    templates: &TemplateEngine,
    message: &EmailMessage,
) -> Result<PreparedContent, EmailError> {
    match message.content() {
        EmailContent::Text { body } => Ok(PreparedContent {
            subject: message.subject().to_string(),
            html: None,
            text: Some(body.clone()),
        }),
        EmailContent::Html { body } => Ok(PreparedContent {
            subject: message.subject().to_string(),
            html: Some(body.clone()),
            text: None,
        }),
        EmailContent::Template { id, variables } => {
            let rendered = templates.render(*id, variables).await?;

            let subject = if rendered.subject.is_empty() {
                message.subject().to_string()
            } else {
                rendered.subject
            };

            Ok(PreparedContent {
                subject,
                html: Some(rendered.html_body).filter(|body| !body.trim().is_empty()),
                text: Some(rendered.text_body).filter(|body| !body.trim().is_empty()),
            })
        }
    }
}
