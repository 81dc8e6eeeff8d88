//! Telegram Bot API client.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{NotifyError, Result};
use crate::format::{MAX_MESSAGE_CHARS, truncate_chars};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

/// Sends pre-rendered HTML messages to a chat.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    endpoint: String,
}

impl Notifier {
    /// Creates a notifier for the given bot token.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_endpoint(format!("https://api.telegram.org/bot{token}/sendMessage"))
    }

    /// Creates a notifier posting to an explicit endpoint. Used by tests and
    /// local API proxies.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Delivers one message. The text is capped at [`MAX_MESSAGE_CHARS`]
    /// characters before sending; `topic_id` selects a forum topic thread.
    ///
    /// # Errors
    ///
    /// [`NotifyError::MissingChatId`] when `chat_id` is empty (the message is
    /// dropped with a warning), [`NotifyError::Http`] on transport failure,
    /// [`NotifyError::Api`] on a non-success API response.
    pub async fn send(&self, text: &str, chat_id: &str, topic_id: Option<i64>) -> Result<()> {
        if chat_id.is_empty() {
            warn!("no chat id resolved, dropping message");
            return Err(NotifyError::MissingChatId);
        }

        let text = truncate_chars(text, MAX_MESSAGE_CHARS);
        let body = SendMessage {
            chat_id,
            text: &text,
            parse_mode: "HTML",
            message_thread_id: topic_id,
        };

        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat api rejected message");
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id, topic_id, chars = text.chars().count(), "message delivered");
        Ok(())
    }
}
