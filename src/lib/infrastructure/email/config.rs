//! Email configuration

use std::{fmt, time::Duration};

use clap::Parser;

use crate::domain::communication::{
    channels::{FallbackChannelSettings, PrimaryChannelSettings, RetryPolicy},
    dispatch::SelectorPolicy,
};

/// Delivery provider configuration
#[derive(Clone, Default, PartialEq, Eq, Parser)]
pub struct EmailProviderConfig {
    /// The provider API key
    #[clap(long = "email-api-key", env = "EMAIL_API_KEY", default_value = "")]
    pub api_key: String,

    /// The verified sending domain
    #[clap(long = "email-domain", env = "EMAIL_DOMAIN", default_value = "")]
    pub domain: String,

    /// The sender email address
    #[clap(long = "email-from-address", env = "EMAIL_FROM_ADDRESS", default_value = "")]
    pub from_address: String,

    /// The sender display name
    #[clap(long = "email-from-name", env = "EMAIL_FROM_NAME", default_value = "")]
    pub from_name: String,

    /// The provider API base URL
    #[clap(
        long = "email-api-base-url",
        env = "EMAIL_API_BASE_URL",
        default_value = "https://api.resend.com"
    )]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[clap(long = "email-timeout-seconds", env = "EMAIL_TIMEOUT_SECONDS", default_value = "30")]
    pub timeout_seconds: u64,

    /// Retries after a failed attempt
    #[clap(long = "email-max-retries", env = "EMAIL_MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    #[clap(long = "email-retry-delay-ms", env = "EMAIL_RETRY_DELAY_MS", default_value = "500")]
    pub retry_delay_ms: u64,

    /// Deployment environment, sent with every request
    #[clap(long = "app-env", env = "APP_ENV", default_value = "development")]
    pub environment: String,
}

impl EmailProviderConfig {
    /// Whether the provider can be used at all
    pub fn is_valid(&self) -> bool {
        [&self.api_key, &self.domain, &self.from_address]
            .iter()
            .all(|value| !value.trim().is_empty())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Retry policy for provider calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    /// Settings for the primary channel
    pub fn channel_settings(&self, app_base_url: &str) -> PrimaryChannelSettings {
        PrimaryChannelSettings {
            from_address: self.from_address.clone(),
            from_name: self.from_name.clone(),
            app_base_url: app_base_url.to_string(),
            retry: self.retry_policy(),
            configured: self.is_valid(),
        }
    }
}

impl fmt::Debug for EmailProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailProviderConfig")
            .field("api_key", &"[redacted]")
            .field("domain", &self.domain)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("environment", &self.environment)
            .finish()
    }
}

/// Dispatch and template configuration
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
pub struct DispatchConfig {
    /// Base URL links in emails point at
    #[clap(long, env = "APP_BASE_URL", default_value = "http://localhost:3000")]
    pub app_base_url: String,

    /// Application name used in templates
    #[clap(long, env = "APP_NAME", default_value = "Resilient Mailer")]
    pub app_name: String,

    /// Consecutive failures before a send is re-routed to the other channel
    #[clap(long, env = "FALLBACK_FAILURE_THRESHOLD", default_value = "1")]
    pub fallback_failure_threshold: u32,

    /// How long loaded templates stay cached, in seconds
    #[clap(long, env = "TEMPLATE_CACHE_TTL_SECONDS", default_value = "3600")]
    pub template_cache_ttl_seconds: u64,
}

impl DispatchConfig {
    /// Selector policy
    pub fn selector_policy(&self) -> SelectorPolicy {
        SelectorPolicy {
            failure_threshold: self.fallback_failure_threshold.max(1),
        }
    }

    /// Template cache TTL
    pub fn template_ttl(&self) -> Duration {
        Duration::from_secs(self.template_cache_ttl_seconds)
    }

    /// Settings for the fallback channel, retrying like the primary
    pub fn fallback_settings(&self, retry: RetryPolicy) -> FallbackChannelSettings {
        FallbackChannelSettings {
            app_base_url: self.app_base_url.clone(),
            retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailProviderConfig {
        EmailProviderConfig::parse_from([
            "test",
            "--email-api-key",
            "re_key",
            "--email-domain",
            "acme.test",
            "--email-from-address",
            "noreply@acme.test",
        ])
    }

    #[test]
    fn test_defaults() {
        let config = config();

        assert_eq!(config.base_url, "https://api.resend.com");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_policy().base_delay, Duration::from_millis(500));
        assert!(config.is_valid());
    }

    #[test]
    fn test_blank_credentials_are_invalid() {
        let config = EmailProviderConfig {
            api_key: "  ".to_string(),
            ..config()
        };

        assert!(!config.is_valid());
        assert!(!config.channel_settings("https://app.acme.test").configured);
    }

    #[test]
    fn test_debug_hides_api_key() {
        assert!(!format!("{:?}", config()).contains("re_key"));
    }

    #[test]
    fn test_threshold_is_at_least_one() {
        let config = DispatchConfig {
            app_base_url: "https://app.acme.test".to_string(),
            app_name: "Acme".to_string(),
            fallback_failure_threshold: 0,
            template_cache_ttl_seconds: 60,
        };

        assert_eq!(config.selector_policy().failure_threshold, 1);
    }
}
