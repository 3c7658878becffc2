//! Adapters to the outside world

pub mod auth;
pub mod email;
pub mod http;
