#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! REST API for the email dispatcher

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use resilient_mailer::{
    domain::communication::{
        channels::{FallbackEmailService, PrimaryEmailService},
        dispatch::{EmailDispatch, EmailDispatcher, EmailServiceSelector},
        templates::{BuiltinTemplates, TemplateEngine},
    },
    infrastructure::{
        auth::{AuthBackendConfig, HttpAuthBackend},
        email::{DispatchConfig, EmailProviderConfig, HttpEmailClient},
        http::{HttpServer, HttpServerConfig},
    },
};
use tracing::{info, warn};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// The delivery provider configuration
    #[clap(flatten)]
    pub provider: EmailProviderConfig,

    /// The authentication backend configuration
    #[clap(flatten)]
    pub auth: AuthBackendConfig,

    /// Dispatch and template configuration
    #[clap(flatten)]
    pub dispatch: DispatchConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Failed to load environment: {}", e);
    }

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if !args.provider.is_valid() {
        warn!("email provider is not configured, sends will use the fallback channel");
    }

    let templates = Arc::new(TemplateEngine::new(
        BuiltinTemplates::new(&args.dispatch.app_name),
        args.dispatch.template_ttl(),
    ));

    let client = HttpEmailClient::new(&args.provider).context("failed to build provider client")?;
    let primary = PrimaryEmailService::new(
        client,
        Arc::clone(&templates),
        args.provider.channel_settings(&args.dispatch.app_base_url),
    );

    let backend = HttpAuthBackend::new(&args.auth).context("failed to build auth backend client")?;
    let fallback = FallbackEmailService::new(
        backend,
        Arc::clone(&templates),
        args.dispatch.fallback_settings(args.provider.retry_policy()),
    );

    let dispatcher = Arc::new(EmailDispatcher::new(
        primary,
        fallback,
        EmailServiceSelector::new(args.dispatch.selector_policy()),
        templates,
    ));

    let report = dispatcher.perform_health_check().await;
    info!(
        overall = ?report.overall,
        primary = ?report.primary,
        fallback = ?report.fallback,
        "initial email health check"
    );

    HttpServer::new(dispatcher, &args.server)?.run().await
}
