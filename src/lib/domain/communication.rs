//! Transactional email: model, templates, channels and dispatch

pub mod channels;
pub mod dispatch;
pub mod email_addresses;
pub mod errors;
pub mod mailer;
pub mod provider;
pub mod templates;
