//! Email metrics handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::communication::{
        dispatch::{DispatchMetrics, EmailDispatch},
        templates::TemplateCacheStatistics,
    },
    infrastructure::http::state::AppState,
};

/// Dispatcher and template cache statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Sends, failures and per-channel statistics
    #[schema(value_type = Object)]
    pub dispatch: DispatchMetrics,

    /// Template cache counters
    #[schema(value_type = Object)]
    pub templates: TemplateCacheStatistics,
}

/// Get dispatcher statistics
#[utoipa::path(
    get,
    operation_id = "email_metrics",
    tag = "Email service",
    path = "/api/v1/email/metrics",
    responses(
        (status = StatusCode::OK, description = "Statistics snapshot", body = MetricsResponse),
    )
)]
pub async fn handler<D: EmailDispatch>(State(state): State<AppState<D>>) -> Json<MetricsResponse> {
    let dispatch = state.email.service_metrics();
    let templates = state.email.template_cache_statistics().await;

    Json(MetricsResponse {
        dispatch,
        templates,
    })
}
