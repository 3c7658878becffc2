//! Operational endpoints of the email dispatcher

pub mod channel;
pub mod health;
pub mod metrics;
pub mod template_cache;
