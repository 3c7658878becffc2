//! HTTP client for the delivery provider's REST API

use std::{
    sync::{PoisonError, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::communication::{
    errors::EmailError,
    mailer::EmailStatus,
    provider::{ConnectionStatus, EmailProviderClient, QuotaInfo, SendEmailRequest, SendEmailResponse},
};

use super::config::EmailProviderConfig;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default)]
struct LastCall {
    response_time: Option<Duration>,
    status: ConnectionStatus,
}

#[derive(Debug, Deserialize)]
struct EmailDetails {
    #[serde(default)]
    last_event: Option<String>,
}

/// Talks to the provider over HTTPS. Makes exactly one request per call.
#[derive(Debug)]
pub struct HttpEmailClient {
    http: Client,
    base_url: String,
    api_key: String,
    environment: String,
    last_call: RwLock<LastCall>,
}

impl HttpEmailClient {
    /// Creates a client with the configured timeout
    pub fn new(config: &EmailProviderConfig) -> Result<Self, EmailError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| EmailError::InvalidConfiguration(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            environment: config.environment.clone(),
            last_call: RwLock::new(LastCall::default()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-Environment", &self.environment)
            .header("X-Request-Id", Uuid::now_v7().to_string())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, EmailError> {
        let started = Instant::now();
        let outcome = request.send().await;
        let elapsed = started.elapsed();

        let mut last_call = self
            .last_call
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match outcome {
            Ok(response) => {
                last_call.response_time = Some(elapsed);
                last_call.status = if response.status().is_success() {
                    ConnectionStatus::Connected
                } else {
                    ConnectionStatus::Error(response.status().as_u16())
                };

                Ok(response)
            }
            Err(err) => {
                last_call.response_time = None;
                last_call.status = ConnectionStatus::Disconnected;

                Err(transport_error(&err))
            }
        }
    }
}

#[async_trait]
impl EmailProviderClient for HttpEmailClient {
    #[instrument(skip_all, fields(recipients = request.to.len()))]
    async fn send(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, EmailError> {
        let response = self
            .execute(self.request(Method::POST, "/emails").json(request))
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let status = response.status().as_u16();

        response
            .json::<SendEmailResponse>()
            .await
            .map_err(|err| EmailError::Unknown {
                status: Some(status),
                message: format!("unreadable provider response: {err}"),
            })
    }

    async fn validate_credentials(&self) -> Result<bool, EmailError> {
        let response = self.execute(self.request(Method::GET, "/domains")).await?;

        match response.status().as_u16() {
            200..=299 => Ok(true),
            401 | 403 => Ok(false),
            _ => Err(error_from(response).await),
        }
    }

    async fn delivery_status(&self, provider_message_id: &str) -> Result<EmailStatus, EmailError> {
        let response = self
            .execute(self.request(Method::GET, &format!("/emails/{provider_message_id}")))
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let status = response.status().as_u16();
        let details = response
            .json::<EmailDetails>()
            .await
            .map_err(|err| EmailError::Unknown {
                status: Some(status),
                message: err.to_string(),
            })?;

        Ok(map_last_event(details.last_event.as_deref()))
    }

    async fn quota(&self) -> Result<QuotaInfo, EmailError> {
        let response = self.execute(self.request(Method::GET, "/domains")).await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let headers = response.headers();

        Ok(QuotaInfo {
            limit: header_u64(headers, "ratelimit-limit"),
            remaining: header_u64(headers, "ratelimit-remaining"),
            reset_seconds: header_u64(headers, "ratelimit-reset"),
        })
    }

    fn last_response_time(&self) -> Option<Duration> {
        self.last_call
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .response_time
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.last_call
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }
}

/// Maps an unsuccessful provider response onto [`EmailError`]
pub fn classify_response(status: u16, body: &str, retry_after: Option<Duration>) -> EmailError {
    let message = error_message(body);

    match status {
        400 => EmailError::InvalidConfiguration(message),
        401 => EmailError::AuthenticationFailed,
        403 => EmailError::ServiceForbidden,
        429 if body.contains("quota") => EmailError::QuotaExceeded,
        429 => EmailError::RateLimited { retry_after },
        500..=599 => EmailError::ServerError { status, message },
        _ => EmailError::Unknown {
            status: Some(status),
            message,
        },
    }
}

async fn error_from(response: Response) -> EmailError {
    let status = response.status().as_u16();
    let retry_after = header_u64(response.headers(), "retry-after").map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();

    debug!(status, %body, "provider returned an error");

    classify_response(status, &body, retry_after)
}

fn transport_error(err: &reqwest::Error) -> EmailError {
    if err.is_timeout() {
        EmailError::TimeoutError
    } else {
        EmailError::NetworkError(err.to_string())
    }
}

fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();

    parsed
        .as_ref()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(serde_json::Value::as_str)
        })
        .map_or_else(|| body.trim().to_string(), ToString::to_string)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn map_last_event(event: Option<&str>) -> EmailStatus {
    match event {
        Some("sent") => EmailStatus::Sent,
        Some("delivered" | "opened" | "clicked" | "complained") => EmailStatus::Delivered,
        Some("bounced") => EmailStatus::Bounced,
        Some("failed" | "canceled") => EmailStatus::Failed,
        Some("suppressed") => EmailStatus::Rejected,
        _ => EmailStatus::Pending,
    }
}
