//! Delivery error types.

use thiserror::Error;

/// Errors raised while delivering a message.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No chat id is configured for the resolved destination; the message
    /// was dropped.
    #[error("no chat id configured, message dropped")]
    MissingChatId,

    /// The HTTP request itself failed (connect, timeout, body).
    #[error("chat api request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The chat API answered with a non-success status.
    #[error("chat api returned {status}: {body}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, as returned by the API.
        body: String,
    },
}

/// Result alias for delivery operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let err = NotifyError::Api {
            status: 400,
            body: "Bad Request: message is too long".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "chat api returned 400: Bad Request: message is too long"
        );
        assert_eq!(
            NotifyError::MissingChatId.to_string(),
            "no chat id configured, message dropped"
        );
    }
}
