//! OpenAPI module

use utoipa::OpenApi;

use crate::infrastructure::http::{errors::ErrorResponse, handlers::v1::*};

#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Resilient Mailer"),
    paths(
        emails::password_reset::handler,
        emails::welcome::handler,
        emails::verification::handler,
        emails::follow_up_welcome::handler,
        email_service::health::handler,
        email_service::metrics::handler,
        email_service::channel::handler,
        email_service::template_cache::show,
        email_service::template_cache::clear,
        uptime::handler
    ),
    components(schemas(
        emails::EmailSentResponse,
        emails::password_reset::PasswordResetBody,
        emails::welcome::WelcomeBody,
        emails::verification::VerificationBody,
        emails::follow_up_welcome::FollowUpWelcomeBody,
        email_service::health::HealthResponse,
        email_service::metrics::MetricsResponse,
        email_service::channel::ChannelSelection,
        email_service::channel::SwitchChannelBody,
        email_service::channel::SwitchChannelResponse,
        email_service::template_cache::TemplateCacheResponse,
        uptime::UptimeResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDocs;
