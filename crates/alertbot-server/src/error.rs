//! Server error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for request handlers.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The `X-Webhook-Secret` header did not match.
    #[error("invalid webhook secret")]
    InvalidSecret,

    /// The request body was not valid JSON.
    #[error("invalid json payload")]
    InvalidPayload,

    /// Message delivery failed; the caller may fall back to sending
    /// directly.
    #[error("delivery failed: {0}")]
    Delivery(#[from] alertbot_telegram::NotifyError),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Self::InvalidSecret => (StatusCode::FORBIDDEN, "invalid_secret"),
            Self::InvalidPayload => (StatusCode::BAD_REQUEST, "invalid_payload"),
            Self::Delivery(_) => (StatusCode::BAD_GATEWAY, "delivery_failed"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"failed to serialize error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServerError::InvalidSecret.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::InvalidPayload.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Delivery(alertbot_telegram::NotifyError::MissingChatId)
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
