//! HTTP client for the authentication backend

use std::{fmt, time::Duration};

use async_trait::async_trait;
use clap::Parser;
use reqwest::{Client, Response};
use serde_json::json;
use tracing::{debug, instrument};

use crate::domain::{
    auth::{AuthBackend, AuthBackendError},
    communication::email_addresses::EmailAddress,
};

/// Authentication backend configuration
#[derive(Clone, Default, PartialEq, Eq, Parser)]
pub struct AuthBackendConfig {
    /// The backend base URL
    #[clap(long = "auth-backend-url", env = "AUTH_BACKEND_URL", default_value = "")]
    pub url: String,

    /// The backend API key
    #[clap(long = "auth-backend-api-key", env = "AUTH_BACKEND_API_KEY", default_value = "")]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[clap(
        long = "auth-backend-timeout-seconds",
        env = "AUTH_BACKEND_TIMEOUT_SECONDS",
        default_value = "10"
    )]
    pub timeout_seconds: u64,
}

impl fmt::Debug for AuthBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthBackendConfig")
            .field("url", &self.url)
            .field("api_key", &"[redacted]")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Calls the backend's recovery and health endpoints
#[derive(Debug)]
pub struct HttpAuthBackend {
    http: Client,
    base_url: String,
    api_key: String,
}

impl HttpAuthBackend {
    /// Creates a backend client with the configured timeout
    pub fn new(config: &AuthBackendConfig) -> Result<Self, AuthBackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|err| AuthBackendError::Unreachable(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{path}", self.base_url)
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    #[instrument(skip_all)]
    async fn send_password_reset(
        &self,
        email: &EmailAddress,
        redirect_to: &str,
    ) -> Result<(), AuthBackendError> {
        let response = self
            .http
            .post(self.url("/recover"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({ "email": email.as_str() }))
            .send()
            .await
            .map_err(transport_error)?;

        check(response).await
    }

    async fn health_check(&self) -> Result<(), AuthBackendError> {
        let response = self
            .http
            .get(self.url("/health"))
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        check(response).await
    }
}

async fn check(response: Response) -> Result<(), AuthBackendError> {
    let status = response.status();

    if status.is_success() {
        return Ok(());
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .map(Duration::from_secs);
    let message = response.text().await.unwrap_or_default();

    debug!(status = status.as_u16(), %message, "auth backend returned an error");

    Err(match status.as_u16() {
        401 | 403 => AuthBackendError::Unauthorized,
        429 => AuthBackendError::RateLimited(retry_after),
        status => AuthBackendError::Status { status, message },
    })
}

fn transport_error(err: reqwest::Error) -> AuthBackendError {
    if err.is_timeout() {
        AuthBackendError::Timeout
    } else {
        AuthBackendError::Unreachable(err.to_string())
    }
}
