//! Local validation of outgoing messages

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::communication::errors::EmailError;

use super::message::{EmailContent, EmailMessage};

lazy_static! {
    static ref UNSAFE_HTML_REGEX: Regex =
        Regex::new(r"(?i)<\s*script\b|javascript\s*:|<[^>]*\son[a-z]+\s*=")
            .expect("unsafe html regex is valid");
}

/// Checks everything about a message that does not need the network.
///
/// Template content is only checked for presence here; missing variables are
/// caught when the template is rendered.
pub fn validate_message(message: &EmailMessage) -> Result<(), EmailError> {
    if message.to().is_empty() {
        return Err(EmailError::InvalidRecipient(
            "at least one recipient is required".to_string(),
        ));
    }

    if let Some(invalid) = message
        .to()
        .iter()
        .chain(message.cc())
        .chain(message.bcc())
        .find(|address| !address.is_valid())
    {
        return Err(EmailError::InvalidRecipient(invalid.to_string()));
    }

    if message.subject().trim().is_empty() {
        return Err(EmailError::EmptySubject);
    }

    match message.content() {
        EmailContent::Text { body } if body.trim().is_empty() => {
            return Err(EmailError::EmptyContent)
        }
        EmailContent::Html { body } => validate_html(body)?,
        _ => {}
    }

    for attachment in message.attachments() {
        attachment.validate()?;
    }

    Ok(())
}

/// Rejects blank HTML and HTML carrying scripts or inline event handlers
pub fn validate_html(html: &str) -> Result<(), EmailError> {
    if html.trim().is_empty() {
        return Err(EmailError::EmptyContent);
    }

    if let Some(found) = UNSAFE_HTML_REGEX.find(html) {
        return Err(EmailError::InvalidHtmlContent(found.as_str().to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::{email_addresses::EmailAddress, mailer::Attachment};

    use super::*;

    fn text(body: &str) -> EmailContent {
        EmailContent::Text {
            body: body.to_string(),
        }
    }

    #[test]
    fn test_valid_message() -> TestResult {
        let message = EmailMessage::builder("Hello", text("Hi there"))
            .to(EmailAddress::new("user@example.com")?)
            .build();

        validate_message(&message)?;

        Ok(())
    }

    #[test]
    fn test_no_recipients() {
        let message = EmailMessage::builder("Hello", text("Hi")).build();

        assert!(matches!(
            validate_message(&message),
            Err(EmailError::InvalidRecipient(_))
        ));
    }

    #[test]
    fn test_invalid_cc_recipient() {
        let message = EmailMessage::builder("Hello", text("Hi"))
            .to(EmailAddress::new_unchecked("user@example.com"))
            .cc(EmailAddress::new_unchecked("nope"))
            .build();

        assert_eq!(
            validate_message(&message),
            Err(EmailError::InvalidRecipient("nope".to_string()))
        );
    }

    #[test]
    fn test_blank_subject() {
        let message = EmailMessage::builder("  \t", text("Hi"))
            .to(EmailAddress::new_unchecked("user@example.com"))
            .build();

        assert_eq!(validate_message(&message), Err(EmailError::EmptySubject));
    }

    #[test]
    fn test_blank_text_body() {
        let message = EmailMessage::builder("Hello", text("\n"))
            .to(EmailAddress::new_unchecked("user@example.com"))
            .build();

        assert_eq!(validate_message(&message), Err(EmailError::EmptyContent));
    }

    #[test]
    fn test_html_with_script_is_rejected() {
        assert!(matches!(
            validate_html("<p>Hi</p><SCRIPT>alert(1)</SCRIPT>"),
            Err(EmailError::InvalidHtmlContent(_))
        ));
        assert!(matches!(
            validate_html(r#"<a href="javascript:alert(1)">x</a>"#),
            Err(EmailError::InvalidHtmlContent(_))
        ));
        assert!(matches!(
            validate_html(r#"<img src="x.png" onerror="alert(1)">"#),
            Err(EmailError::InvalidHtmlContent(_))
        ));
    }

    #[test]
    fn test_plain_html_is_accepted() -> TestResult {
        validate_html("<p>Meet me at one = two o'clock</p>")?;

        Ok(())
    }

    #[test]
    fn test_attachment_type_is_checked() -> TestResult {
        let message = EmailMessage::builder("Hello", text("Hi"))
            .to(EmailAddress::new_unchecked("user@example.com"))
            .attachment(Attachment::new("run.sh", "application/x-sh", vec![1])?)
            .build();

        assert!(matches!(
            validate_message(&message),
            Err(EmailError::InvalidAttachmentType { .. })
        ));

        Ok(())
    }
}
