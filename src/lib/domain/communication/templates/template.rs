//! Template identifiers and content

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::communication::email_addresses::EmailAddress;

/// Identifies one of the account-lifecycle templates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    /// Password reset link
    PasswordReset,

    /// Welcome after sign-up
    Welcome,

    /// Email address verification link
    AccountVerification,

    /// Second welcome, sent some time after sign-up
    FollowUpWelcome,
}

impl TemplateId {
    /// Every known template
    pub const ALL: [TemplateId; 4] = [
        TemplateId::PasswordReset,
        TemplateId::Welcome,
        TemplateId::AccountVerification,
        TemplateId::FollowUpWelcome,
    ];

    /// Stable string form, used in tags and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::Welcome => "welcome",
            Self::AccountVerification => "account_verification",
            Self::FollowUpWelcome => "follow_up_welcome",
        }
    }

    /// Variables the template cannot render without
    pub fn required_variables(&self) -> &'static [&'static str] {
        match self {
            Self::PasswordReset => &["user_email", "reset_url"],
            Self::Welcome | Self::FollowUpWelcome => &["user_name"],
            Self::AccountVerification => &["user_email", "verification_url"],
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A standard email flow and the data it needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Password reset
    PasswordReset {
        /// Link the user follows to pick a new password
        reset_url: String,
    },

    /// Welcome
    Welcome {
        /// Name used in the greeting
        user_name: String,
    },

    /// Account verification
    AccountVerification {
        /// Link the user follows to verify the address
        verification_url: String,
    },

    /// Follow-up welcome
    FollowUpWelcome {
        /// Name used in the greeting
        user_name: String,
    },
}

impl EmailTemplate {
    /// Password reset pointing at `{base_url}/reset-password`
    pub fn password_reset(base_url: &str, token: &str) -> Self {
        Self::PasswordReset {
            reset_url: format!(
                "{}/reset-password?token={token}",
                base_url.trim_end_matches('/')
            ),
        }
    }

    /// Account verification pointing at `{base_url}/verify-email`
    pub fn account_verification(base_url: &str, token: &str) -> Self {
        Self::AccountVerification {
            verification_url: format!(
                "{}/verify-email?token={token}",
                base_url.trim_end_matches('/')
            ),
        }
    }

    /// The template this flow renders
    pub fn id(&self) -> TemplateId {
        match self {
            Self::PasswordReset { .. } => TemplateId::PasswordReset,
            Self::Welcome { .. } => TemplateId::Welcome,
            Self::AccountVerification { .. } => TemplateId::AccountVerification,
            Self::FollowUpWelcome { .. } => TemplateId::FollowUpWelcome,
        }
    }

    /// Subject used on the message before rendering
    pub fn default_subject(&self) -> &'static str {
        match self {
            Self::PasswordReset { .. } => "Reset your password",
            Self::Welcome { .. } => "Welcome aboard",
            Self::AccountVerification { .. } => "Verify your email address",
            Self::FollowUpWelcome { .. } => "Getting the most out of your account",
        }
    }

    /// Variables to render the template with
    pub fn variables(&self, recipient: &EmailAddress) -> BTreeMap<String, String> {
        let mut variables = BTreeMap::new();

        match self {
            Self::PasswordReset { reset_url } => {
                variables.insert("user_email".to_string(), recipient.to_string());
                variables.insert("reset_url".to_string(), reset_url.clone());
            }
            Self::AccountVerification { verification_url } => {
                variables.insert("user_email".to_string(), recipient.to_string());
                variables.insert("verification_url".to_string(), verification_url.clone());
            }
            Self::Welcome { user_name } | Self::FollowUpWelcome { user_name } => {
                variables.insert("user_name".to_string(), user_name.clone());
            }
        }

        variables
    }
}

/// A template before variable substitution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContent {
    /// Subject line
    pub subject: String,

    /// HTML body
    pub html_body: String,

    /// Plain text body
    pub text_body: String,
}

/// A template after variable substitution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmailContent {
    /// Subject line
    pub subject: String,

    /// HTML body
    pub html_body: String,

    /// Plain text body
    pub text_body: String,

    /// When rendering happened
    pub rendered_at: DateTime<Utc>,
}

/// Outcome of checking template data against a template's required variables
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateValidation {
    /// No required variable is missing
    pub is_valid: bool,

    /// Required variables that were not supplied
    pub missing_variables: Vec<String>,

    /// Supplied variables the template does not use
    pub unused_variables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_url() {
        let template = EmailTemplate::password_reset("https://example.com/", "abc123");

        assert_eq!(
            template,
            EmailTemplate::PasswordReset {
                reset_url: "https://example.com/reset-password?token=abc123".to_string()
            }
        );
    }

    #[test]
    fn test_variables_cover_required_set() {
        let recipient = EmailAddress::new_unchecked("user@example.com");

        let templates = [
            EmailTemplate::password_reset("https://example.com", "t"),
            EmailTemplate::Welcome {
                user_name: "Ada".into(),
            },
            EmailTemplate::account_verification("https://example.com", "t"),
            EmailTemplate::FollowUpWelcome {
                user_name: "Ada".into(),
            },
        ];

        for template in templates {
            let variables = template.variables(&recipient);
            let mut keys: Vec<&str> = variables.keys().map(String::as_str).collect();
            let mut required = template.id().required_variables().to_vec();

            keys.sort_unstable();
            required.sort_unstable();

            assert_eq!(keys, required, "{}", template.id());
        }
    }

    #[test]
    fn test_template_id_serializes_as_snake_case() {
        let json = serde_json::to_string(&TemplateId::FollowUpWelcome).unwrap();

        assert_eq!(json, "\"follow_up_welcome\"");
        assert_eq!(TemplateId::FollowUpWelcome.to_string(), "follow_up_welcome");
    }
}
