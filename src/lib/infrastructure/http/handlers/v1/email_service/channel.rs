//! Channel override handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    domain::communication::{dispatch::EmailDispatch, mailer::EmailChannel},
    infrastructure::http::{errors::ApiError, state::AppState},
};

/// Channel selection mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSelection {
    /// Pin sends to the primary channel
    Primary,

    /// Pin sends to the fallback channel
    Fallback,

    /// Let the selector decide
    Auto,
}

impl From<ChannelSelection> for Option<EmailChannel> {
    fn from(selection: ChannelSelection) -> Self {
        match selection {
            ChannelSelection::Primary => Some(EmailChannel::Primary),
            ChannelSelection::Fallback => Some(EmailChannel::Fallback),
            ChannelSelection::Auto => None,
        }
    }
}

/// Channel override request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SwitchChannelBody {
    /// Requested mode
    pub channel: ChannelSelection,
}

/// Channel selection after the switch
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SwitchChannelResponse {
    /// Channel the next send will use
    #[schema(value_type = String, example = "fallback")]
    pub active_channel: EmailChannel,

    /// Pinned channel, absent in automatic mode
    #[schema(value_type = Option<String>, example = "fallback")]
    pub manual_override: Option<EmailChannel>,
}

/// Pin sends to one channel or return to automatic selection
#[utoipa::path(
    put,
    operation_id = "switch_email_channel",
    tag = "Email service",
    path = "/api/v1/email/channel",
    request_body = SwitchChannelBody,
    responses(
        (status = StatusCode::OK, description = "Selection updated", body = SwitchChannelResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Unknown channel", body = ErrorResponse),
    )
)]
pub async fn handler<D: EmailDispatch>(
    State(state): State<AppState<D>>,
    request: Result<Json<SwitchChannelBody>, JsonRejection>,
) -> Result<Json<SwitchChannelResponse>, ApiError> {
    let Json(request) = request?;

    info!(selection = ?request.channel, "switching email channel");

    state.email.switch_channel(request.channel.into());

    let metrics = state.email.service_metrics();

    Ok(Json(SwitchChannelResponse {
        active_channel: metrics.active_channel,
        manual_override: metrics.manual_override,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use mockall::predicate::eq;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::communication::{
            dispatch::{DispatchMetrics, MockEmailDispatch},
            mailer::{ChannelMetrics, EmailChannel, ServiceHealthStatus},
        },
        infrastructure::http::{router, state::tests::test_state},
    };

    use super::SwitchChannelResponse;

    fn metrics(
        active_channel: EmailChannel,
        manual_override: Option<EmailChannel>,
    ) -> DispatchMetrics {
        let channel = |channel| ChannelMetrics {
            channel,
            health: ServiceHealthStatus::Unknown,
            total_sent: 0,
            sent_today: 0,
            total_failed: 0,
            consecutive_failures: 0,
            last_success_at: None,
            last_failure_at: None,
            last_error: None,
            average_response_time_ms: None,
        };

        DispatchMetrics {
            primary_sent: 0,
            fallback_sent: 0,
            fallback_activations: 0,
            total_failures: 0,
            active_channel,
            manual_override,
            overall_health: ServiceHealthStatus::Unknown,
            primary: channel(EmailChannel::Primary),
            fallback: channel(EmailChannel::Fallback),
        }
    }

    #[tokio::test]
    async fn test_pin_fallback() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_switch_channel()
            .with(eq(Some(EmailChannel::Fallback)))
            .times(1)
            .return_const(());
        email
            .expect_service_metrics()
            .returning(|| metrics(EmailChannel::Fallback, Some(EmailChannel::Fallback)));

        let response = TestServer::new(router(test_state(Some(email))))?
            .put("/api/v1/email/channel")
            .json(&json!({ "channel": "fallback" }))
            .await;

        response.assert_status_ok();

        let json = response.json::<SwitchChannelResponse>();

        assert_eq!(json.active_channel, EmailChannel::Fallback);
        assert_eq!(json.manual_override, Some(EmailChannel::Fallback));

        Ok(())
    }

    #[tokio::test]
    async fn test_back_to_automatic() -> TestResult {
        let mut email = MockEmailDispatch::new();

        email
            .expect_switch_channel()
            .with(eq(None))
            .times(1)
            .return_const(());
        email
            .expect_service_metrics()
            .returning(|| metrics(EmailChannel::Primary, None));

        let response = TestServer::new(router(test_state(Some(email))))?
            .put("/api/v1/email/channel")
            .json(&json!({ "channel": "auto" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<SwitchChannelResponse>().manual_override, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_channel() -> TestResult {
        let response = TestServer::new(router(test_state(None)))?
            .put("/api/v1/email/channel")
            .json(&json!({ "channel": "carrier-pigeon" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        Ok(())
    }
}
