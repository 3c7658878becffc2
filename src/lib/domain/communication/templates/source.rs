//! Where template content comes from

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::errors::EmailError;

use super::template::{TemplateContent, TemplateId};

/// Produces raw template content on a cache miss
#[async_trait]
pub trait TemplateSource: Send + Sync + 'static {
    /// Fetch the content of a template
    async fn fetch(&self, id: TemplateId) -> Result<TemplateContent, EmailError>;
}

#[cfg(test)]
mock! {
    pub TemplateSource {}

    #[async_trait]
    impl TemplateSource for TemplateSource {
        async fn fetch(&self, id: TemplateId) -> Result<TemplateContent, EmailError>;
    }
}

const STYLE: &str = r#"<style>
  body { background: #f4f4f7; font-family: Helvetica, Arial, sans-serif; color: #33334d; }
  .card { background: #ffffff; max-width: 560px; margin: 24px auto; padding: 32px; border-radius: 8px; }
  .button { display: inline-block; background: #4f46e5; color: #ffffff; padding: 12px 24px; border-radius: 6px; text-decoration: none; }
  .footer { color: #8e8ea9; font-size: 12px; text-align: center; }
</style>"#;

/// Templates compiled into the binary, branded with the application name
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    app_name: String,
}

impl BuiltinTemplates {
    /// Creates the built-in template set
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
        }
    }

    fn html(&self, heading: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n{STYLE}\n</head>\n<body>\n\
             <div class=\"card\">\n<h1>{heading}</h1>\n{body}\n</div>\n\
             <p class=\"footer\">{app} &middot; You received this email because of activity on your account.</p>\n\
             </body>\n</html>",
            app = self.app_name
        )
    }

    fn content(&self, id: TemplateId) -> TemplateContent {
        let app = &self.app_name;

        match id {
            TemplateId::PasswordReset => TemplateContent {
                subject: format!("Reset your {app} password"),
                html_body: self.html(
                    "Reset your password",
                    "<p>We received a request to reset the password for {{ user_email }}.</p>\n\
                     <p><a class=\"button\" href=\"{{ reset_url }}\">Choose a new password</a></p>\n\
                     <p>If you did not ask for this, you can ignore this email.</p>",
                ),
                text_body: "We received a request to reset the password for {{ user_email }}.\n\n\
                            Choose a new password: {{ reset_url }}\n\n\
                            If you did not ask for this, you can ignore this email."
                    .to_string(),
            },
            TemplateId::Welcome => TemplateContent {
                subject: format!("Welcome to {app}, {{{{ user_name }}}}!"),
                html_body: self.html(
                    &format!("Welcome to {app}"),
                    "<p>Hi {{ user_name }},</p>\n<p>Your account is ready. We are glad to have you.</p>",
                ),
                text_body: format!(
                    "Hi {{{{ user_name }}}},\n\nYour {app} account is ready. We are glad to have you."
                ),
            },
            TemplateId::AccountVerification => TemplateContent {
                subject: format!("Verify your {app} email address"),
                html_body: self.html(
                    "Verify your email address",
                    "<p>Please confirm that {{ user_email }} is your email address.</p>\n\
                     <p><a class=\"button\" href=\"{{ verification_url }}\">Verify email</a></p>",
                ),
                text_body: "Please confirm that {{ user_email }} is your email address:\n\n\
                            {{ verification_url }}"
                    .to_string(),
            },
            TemplateId::FollowUpWelcome => TemplateContent {
                subject: format!("Getting the most out of {app}"),
                html_body: self.html(
                    "A few tips to get started",
                    "<p>Hi {{ user_name }},</p>\n\
                     <p>Now that you have settled in, here is what most people set up next: \
                     your profile, notifications and a first project.</p>",
                ),
                text_body: format!(
                    "Hi {{{{ user_name }}}},\n\nNow that you have settled in with {app}, here is what \
                     most people set up next: your profile, notifications and a first project."
                ),
            },
        }
    }
}

#[async_trait]
impl TemplateSource for BuiltinTemplates {
    async fn fetch(&self, id: TemplateId) -> Result<TemplateContent, EmailError> {
        Ok(self.content(id))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn test_builtin_templates_reference_their_required_variables() -> TestResult {
        let source = BuiltinTemplates::new("Acme");

        for id in TemplateId::ALL {
            let content = source.fetch(id).await?;

            for name in id.required_variables() {
                let placeholder = format!("{{{{ {name} }}}}");

                assert!(
                    content.html_body.contains(&placeholder) || content.text_body.contains(&placeholder),
                    "{id} does not use {name}"
                );
            }
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_app_name_is_baked_in() -> TestResult {
        let content = BuiltinTemplates::new("Acme").fetch(TemplateId::Welcome).await?;

        assert_eq!(content.subject, "Welcome to Acme, {{ user_name }}!");
        assert!(content.text_body.starts_with("Hi {{ user_name }},"));

        Ok(())
    }
}
