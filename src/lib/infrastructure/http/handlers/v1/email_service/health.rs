//! Email health handler

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::communication::{
        dispatch::{EmailDispatch, HealthReport},
        mailer::{EmailChannel, ServiceHealthStatus},
    },
    infrastructure::http::state::AppState,
};

/// Health of both channels
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Aggregate status
    #[schema(value_type = String, example = "healthy")]
    pub overall: ServiceHealthStatus,

    /// Primary channel status
    #[schema(value_type = String, example = "healthy")]
    pub primary: ServiceHealthStatus,

    /// Fallback channel status
    #[schema(value_type = String, example = "degraded")]
    pub fallback: ServiceHealthStatus,

    /// Channel the next send would use
    #[schema(value_type = String, example = "primary")]
    pub active_channel: EmailChannel,

    /// When the probes finished
    pub checked_at: DateTime<Utc>,

    /// Seconds since the server started
    #[schema(example = 123)]
    pub uptime_seconds: i64,
}

impl HealthResponse {
    fn new(report: HealthReport, uptime_seconds: i64) -> Self {
        Self {
            overall: report.overall,
            primary: report.primary,
            fallback: report.fallback,
            active_channel: report.active_channel,
            checked_at: report.checked_at,
            uptime_seconds,
        }
    }
}

/// Probe both channels
#[utoipa::path(
    get,
    operation_id = "email_health",
    tag = "Email service",
    path = "/api/v1/email/health",
    responses(
        (status = StatusCode::OK, description = "At least one channel can send", body = HealthResponse),
        (status = StatusCode::SERVICE_UNAVAILABLE, description = "No channel can send", body = HealthResponse),
    )
)]
pub async fn handler<D: EmailDispatch>(
    State(state): State<AppState<D>>,
) -> (StatusCode, Json<HealthResponse>) {
    let report = state.email.perform_health_check().await;
    let uptime_seconds = Utc::now().timestamp() - state.start_time.timestamp();

    let status = match report.overall {
        ServiceHealthStatus::Unhealthy | ServiceHealthStatus::Disabled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::OK,
    };

    (status, Json(HealthResponse::new(report, uptime_seconds)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::Utc;
    use testresult::TestResult;

    use crate::{
        domain::communication::{
            dispatch::{HealthReport, MockEmailDispatch},
            mailer::{EmailChannel, ServiceHealthStatus},
        },
        infrastructure::http::{router, state::tests::test_state},
    };

    use super::HealthResponse;

    fn dispatcher_reporting(
        overall: ServiceHealthStatus,
        primary: ServiceHealthStatus,
        fallback: ServiceHealthStatus,
    ) -> MockEmailDispatch {
        let mut email = MockEmailDispatch::new();

        email
            .expect_perform_health_check()
            .times(1)
            .returning(move || HealthReport {
                overall,
                primary,
                fallback,
                active_channel: EmailChannel::Fallback,
                checked_at: Utc::now(),
            });

        email
    }

    #[tokio::test]
    async fn test_degraded_is_still_ok() -> TestResult {
        let email = dispatcher_reporting(
            ServiceHealthStatus::Degraded,
            ServiceHealthStatus::Unhealthy,
            ServiceHealthStatus::Healthy,
        );

        let response = TestServer::new(router(test_state(Some(email))))?
            .get("/api/v1/email/health")
            .await;

        let json = response.json::<HealthResponse>();

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(json.overall, ServiceHealthStatus::Degraded);
        assert_eq!(json.primary, ServiceHealthStatus::Unhealthy);
        assert_eq!(json.active_channel, EmailChannel::Fallback);

        Ok(())
    }

    #[tokio::test]
    async fn test_unhealthy_is_service_unavailable() -> TestResult {
        let email = dispatcher_reporting(
            ServiceHealthStatus::Unhealthy,
            ServiceHealthStatus::Disabled,
            ServiceHealthStatus::Unhealthy,
        );

        let response = TestServer::new(router(test_state(Some(email))))?
            .get("/api/v1/email/health")
            .await;

        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.json::<HealthResponse>().overall,
            ServiceHealthStatus::Unhealthy
        );

        Ok(())
    }
}
