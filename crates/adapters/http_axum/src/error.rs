//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use timerhub_domain::error::TimerHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`TimerHubError`] to an HTTP response with appropriate status code.
pub struct ApiError(TimerHubError);

impl<E: Into<TimerHubError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            TimerHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            TimerHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            TimerHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
