//! HTTP error responses.
//!
//! Every failure renders as `{"error": "<message>"}` with a status that
//! tells the caller whose fault it was: 4xx for the request shape or the
//! rate ceiling, 5xx for the upstream model.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;
use variant_core::RelayError;

/// Message returned when `config` or `nodes` is absent or unusable.
pub const MISSING_FIELDS: &str = "config and nodes required";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Body parsed but has the wrong shape.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Body could not be read as JSON (syntax, content type, size).
    #[error("Invalid request: {}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error("Too many requests, please try again later.")]
    RateLimited,
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ApiError {
    pub fn missing_fields() -> Self {
        ApiError::InvalidRequest(MISSING_FIELDS.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("generation failed: {self}");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_split_client_and_server_faults() {
        assert_eq!(ApiError::missing_fields().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::Relay(RelayError::EmptyReply).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_fields_message() {
        assert_eq!(
            ApiError::missing_fields().to_string(),
            "Invalid request: config and nodes required"
        );
    }

    #[test]
    fn relay_message_passes_through() {
        let err = ApiError::from(RelayError::Upstream("request failed: refused".into()));
        assert_eq!(err.to_string(), "request failed: refused");
    }
}
