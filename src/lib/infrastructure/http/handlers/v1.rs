//! Version 1 of the API

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    domain::communication::dispatch::EmailDispatch,
    infrastructure::http::{open_api::ApiDocs, state::AppState},
};

pub mod email_service;
pub mod emails;
pub mod stoplight;
pub mod uptime;

/// Routes under `/api/v1`
pub fn router<D: EmailDispatch>() -> Router<AppState<D>> {
    Router::new()
        .route("/", get(stoplight::handler))
        .route("/openapi.json", get(Json(ApiDocs::openapi())))
        .route("/uptime", get(uptime::handler::<D>))
        .route(
            "/emails/password-reset",
            post(emails::password_reset::handler::<D>),
        )
        .route("/emails/welcome", post(emails::welcome::handler::<D>))
        .route(
            "/emails/verification",
            post(emails::verification::handler::<D>),
        )
        .route(
            "/emails/follow-up-welcome",
            post(emails::follow_up_welcome::handler::<D>),
        )
        .route("/email/health", get(email_service::health::handler::<D>))
        .route("/email/metrics", get(email_service::metrics::handler::<D>))
        .route("/email/channel", put(email_service::channel::handler::<D>))
        .route(
            "/email/templates/cache",
            get(email_service::template_cache::show::<D>)
                .delete(email_service::template_cache::clear::<D>),
        )
}
