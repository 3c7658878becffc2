//! Error types for the email module

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::email_addresses::EmailAddressError;

/// How bad an [`EmailError`] is for the channel that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Caller mistake, the channel is fine
    Info,

    /// Transient pressure or a content bug
    Warning,

    /// The channel is failing
    Error,

    /// The channel cannot be used until an operator intervenes
    Critical,
}

/// Email errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    /// A transport-level failure talking to the provider
    #[error("network error: {0}")]
    NetworkError(String),

    /// The provider did not answer within the configured timeout
    #[error("request to the email provider timed out")]
    TimeoutError,

    /// The provider is throttling requests
    #[error("rate limited by the email provider")]
    RateLimited {
        /// Provider hint for when to try again
        retry_after: Option<Duration>,
    },

    /// The provider rejected the API key
    #[error("authentication with the email provider failed")]
    AuthenticationFailed,

    /// The provider refused the request for this account
    #[error("the email provider refused the request")]
    ServiceForbidden,

    /// The provider considered the request malformed
    #[error("invalid email provider configuration: {0}")]
    InvalidConfiguration(String),

    /// A recipient is missing or not a valid address
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The subject is blank
    #[error("email subject is empty")]
    EmptySubject,

    /// The body is blank
    #[error("email content is empty")]
    EmptyContent,

    /// The HTML body contains markup that must not be sent
    #[error("invalid HTML content: {0}")]
    InvalidHtmlContent(String),

    /// An attachment is over the size ceiling
    #[error("attachment \"{filename}\" is too large ({size} bytes)")]
    AttachmentTooLarge {
        /// Attachment file name
        filename: String,
        /// Attachment size in bytes
        size: usize,
    },

    /// An attachment has a content type outside the allow-list
    #[error("attachment \"{filename}\" has unsupported type \"{content_type}\"")]
    InvalidAttachmentType {
        /// Attachment file name
        filename: String,
        /// Offending content type
        content_type: String,
    },

    /// A template could not be produced or rendered
    #[error("template rendering failed: {0}")]
    TemplateRenderFailed(String),

    /// A template placeholder had no value
    #[error("template variable \"{0}\" is missing")]
    TemplateVariableMissing(String),

    /// The provider answered with an error status
    #[error("email provider returned {status}: {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Provider message
        message: String,
    },

    /// The account's sending quota is used up
    #[error("email quota exceeded")]
    QuotaExceeded,

    /// The primary channel cannot send right now
    #[error("primary email service is unavailable")]
    PrimaryServiceUnavailable,

    /// No channel is able to send
    #[error("all email services are unavailable")]
    AllServicesUnavailable,

    /// Anything the provider returned that has no better classification
    #[error("unknown email error ({status:?}): {message}")]
    Unknown {
        /// HTTP status code, if there was a response
        status: Option<u16>,
        /// Provider message
        message: String,
    },
}

impl EmailError {
    /// Whether another attempt on the same channel may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::TimeoutError | Self::RateLimited { .. } => true,
            Self::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure says something about the channel rather than the message
    pub fn triggers_fallback(&self) -> bool {
        match self {
            Self::NetworkError(_)
            | Self::TimeoutError
            | Self::RateLimited { .. }
            | Self::AuthenticationFailed
            | Self::ServiceForbidden
            | Self::InvalidConfiguration(_)
            | Self::QuotaExceeded => true,
            Self::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Severity used to drive channel health
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidRecipient(_)
            | Self::EmptySubject
            | Self::EmptyContent
            | Self::InvalidHtmlContent(_)
            | Self::AttachmentTooLarge { .. }
            | Self::InvalidAttachmentType { .. } => ErrorSeverity::Info,
            Self::RateLimited { .. }
            | Self::TemplateRenderFailed(_)
            | Self::TemplateVariableMissing(_) => ErrorSeverity::Warning,
            Self::AuthenticationFailed
            | Self::ServiceForbidden
            | Self::QuotaExceeded
            | Self::AllServicesUnavailable => ErrorSeverity::Critical,
            Self::NetworkError(_)
            | Self::TimeoutError
            | Self::InvalidConfiguration(_)
            | Self::ServerError { .. }
            | Self::PrimaryServiceUnavailable
            | Self::Unknown { .. } => ErrorSeverity::Error,
        }
    }

    /// Whether the error was raised by local validation, before any network I/O
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRecipient(_)
                | Self::EmptySubject
                | Self::EmptyContent
                | Self::InvalidHtmlContent(_)
                | Self::AttachmentTooLarge { .. }
                | Self::InvalidAttachmentType { .. }
        )
    }

    /// Retry hint carried by a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<EmailAddressError> for EmailError {
    fn from(err: EmailAddressError) -> Self {
        debug!("EmailAddressError -> EmailError");

        EmailError::InvalidRecipient(err.to_string())
    }
}

impl From<css_inline::InlineError> for EmailError {
    fn from(err: css_inline::InlineError) -> Self {
        debug!("InlineError -> EmailError");

        EmailError::TemplateRenderFailed(err.to_string())
    }
}
