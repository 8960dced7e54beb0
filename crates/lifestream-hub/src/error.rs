//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies request-level failures into a single enum that
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": <message>, "status": <code>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::hub::HubError;

/// Errors that can occur while handling an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested viewport was empty or outside the grid.
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),

    /// Query parameters were missing or malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::Viewport { source } => Self::InvalidViewport(source.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidViewport(msg) | Self::InvalidQuery(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
