//! Authentication backend adapter

mod backend;

pub use backend::{AuthBackendConfig, HttpAuthBackend};
