//! Template cache handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::communication::{dispatch::EmailDispatch, templates::TemplateCacheStatistics},
    infrastructure::http::state::AppState,
};

/// Template cache counters
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateCacheResponse {
    /// Fresh entries currently cached
    #[schema(example = 2)]
    pub cached_templates: usize,

    /// Loads served from the cache
    pub hits: u64,

    /// Loads that went to the source
    pub misses: u64,

    /// Cache TTL in seconds
    #[schema(example = 3600)]
    pub ttl_seconds: u64,

    /// Ids of the cached templates
    #[schema(example = json!(["welcome", "password_reset"]))]
    pub templates: Vec<String>,
}

impl From<TemplateCacheStatistics> for TemplateCacheResponse {
    fn from(stats: TemplateCacheStatistics) -> Self {
        Self {
            cached_templates: stats.cached_templates,
            hits: stats.hits,
            misses: stats.misses,
            ttl_seconds: stats.ttl_seconds,
            templates: stats.templates.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Get template cache counters
#[utoipa::path(
    get,
    operation_id = "template_cache_statistics",
    tag = "Email service",
    path = "/api/v1/email/templates/cache",
    responses(
        (status = StatusCode::OK, description = "Cache counters", body = TemplateCacheResponse),
    )
)]
pub async fn show<D: EmailDispatch>(
    State(state): State<AppState<D>>,
) -> Json<TemplateCacheResponse> {
    Json(state.email.template_cache_statistics().await.into())
}

/// Drop cached templates
#[utoipa::path(
    delete,
    operation_id = "clear_template_cache",
    tag = "Email service",
    path = "/api/v1/email/templates/cache",
    responses(
        (status = StatusCode::NO_CONTENT, description = "Cache cleared"),
    )
)]
pub async fn clear<D: EmailDispatch>(State(state): State<AppState<D>>) -> StatusCode {
    state.email.clear_template_cache().await;

    StatusCode::NO_CONTENT
}
