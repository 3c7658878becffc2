//! Request handlers

use std::any::Any;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::error;

use super::errors::ErrorResponse;

pub mod v1;

/// Catch panics and return a 500 error
pub fn panic_handler(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };

    error!(%details, "handler panicked");

    let response = Json(ErrorResponse { error: details }).into_response();

    (StatusCode::INTERNAL_SERVER_ERROR, response).into_response()
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use axum::body::to_bytes;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn test_panic_handler() -> TestResult {
        let response = panic_handler(simulate_panic());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json = serde_json::from_slice::<serde_json::Value>(&body)?;

        assert_eq!(json, serde_json::json!({ "error": "template cache poisoned" }));

        Ok(())
    }

    fn simulate_panic() -> Box<dyn Any + Send + 'static> {
        match panic::catch_unwind(AssertUnwindSafe(|| panic!("template cache poisoned"))) {
            Err(err) => err,
            Ok(()) => panic!("The panic did not occur as expected"),
        }
    }
}
