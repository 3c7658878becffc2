//! Application state module

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::domain::communication::dispatch::EmailDispatch;

/// Global application state
pub struct AppState<D: EmailDispatch> {
    /// The time the server started
    pub start_time: DateTime<Utc>,

    /// Email dispatcher
    pub email: Arc<D>,
}

impl<D: EmailDispatch> AppState<D> {
    /// Create a new application state
    pub fn new(email: Arc<D>) -> Self {
        Self {
            start_time: Utc::now(),
            email,
        }
    }
}

impl<D: EmailDispatch> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            start_time: self.start_time,
            email: Arc::clone(&self.email),
        }
    }
}

impl<D: EmailDispatch> fmt::Debug for AppState<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .field("email", &"EmailDispatch")
            .finish()
    }
}
