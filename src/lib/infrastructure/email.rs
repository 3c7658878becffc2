//! Delivery provider adapter

mod api;
mod config;

pub use api::{classify_response, HttpEmailClient};
pub use config::{DispatchConfig, EmailProviderConfig};
