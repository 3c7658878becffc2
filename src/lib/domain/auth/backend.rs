//! Authentication backend port
//!
//! Only the pieces of the backend the fallback email channel relies on.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::{email_addresses::EmailAddress, errors::EmailError};

/// Errors returned by the authentication backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthBackendError {
    /// The backend could not be reached
    #[error("auth backend unreachable: {0}")]
    Unreachable(String),

    /// The backend did not answer in time
    #[error("auth backend timed out")]
    Timeout,

    /// The backend rejected our API key
    #[error("auth backend rejected the API key")]
    Unauthorized,

    /// The backend is throttling requests
    #[error("rate limited by auth backend")]
    RateLimited(Option<Duration>),

    /// The backend answered with an error status
    #[error("auth backend returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Backend message
        message: String,
    },
}

impl From<AuthBackendError> for EmailError {
    fn from(err: AuthBackendError) -> Self {
        debug!("AuthBackendError -> EmailError");

        match err {
            AuthBackendError::Unreachable(message) => EmailError::NetworkError(message),
            AuthBackendError::Timeout => EmailError::TimeoutError,
            AuthBackendError::Unauthorized => EmailError::AuthenticationFailed,
            AuthBackendError::RateLimited(retry_after) => EmailError::RateLimited { retry_after },
            AuthBackendError::Status { status, message } => {
                EmailError::ServerError { status, message }
            }
        }
    }
}

/// Authentication backend
#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    /// Ask the backend to email its own password reset link
    ///
    /// # Arguments
    /// * `email` - The account's [`EmailAddress`].
    /// * `redirect_to` - Where the link in the email should land.
    async fn send_password_reset(
        &self,
        email: &EmailAddress,
        redirect_to: &str,
    ) -> Result<(), AuthBackendError>;

    /// Whether the backend is reachable and accepts our key
    async fn health_check(&self) -> Result<(), AuthBackendError>;
}

#[cfg(test)]
mock! {
    pub AuthBackend {}

    #[async_trait]
    impl AuthBackend for AuthBackend {
        async fn send_password_reset(&self, email: &EmailAddress, redirect_to: &str) -> Result<(), AuthBackendError>;
        async fn health_check(&self) -> Result<(), AuthBackendError>;
    }
}
