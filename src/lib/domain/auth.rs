//! Authentication backend boundary

mod backend;

pub use backend::{AuthBackend, AuthBackendError};

#[cfg(test)]
pub mod tests {
    //! Mocks for the auth ports

    pub use super::backend::MockAuthBackend;
}
