use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::{ApiError, BotApi, ChatId, MessageRef};
use crate::markup::{refresh_keyboard, OutgoingMessage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("failed to deliver telegram message: {0}")]
    Send(#[source] ApiError),
}

/// Delivers status messages to the operator chat, reusing the most recent
/// message when asked to.
pub struct NotificationSink {
    api: Arc<dyn BotApi>,
    chat_id: ChatId,
    outstanding: Mutex<Option<MessageRef>>,
}

impl NotificationSink {
    pub fn new(api: Arc<dyn BotApi>, chat_id: ChatId) -> Self {
        Self { api, chat_id, outstanding: Mutex::new(None) }
    }

    /// Edits the outstanding message when `allow_update` is set and one
    /// exists, otherwise sends a new one. A failed edit falls back to a new
    /// message. The reference only moves after a successful send.
    pub async fn send_or_update(
        &self,
        text: &str,
        allow_update: bool,
    ) -> Result<MessageRef, NotifyError> {
        let keyboard = refresh_keyboard();
        let mut outstanding = self.outstanding.lock().await;

        if let Some(target) = (*outstanding).filter(|_| allow_update) {
            match self.api.edit_message_text(target, text, Some(&keyboard)).await {
                Ok(()) => {
                    debug!(
                        event_name = "telegram.message_edited",
                        message_id = target.message_id,
                        "status message edited"
                    );
                    return Ok(target);
                }
                Err(error) if error.is_not_modified() => {
                    debug!(
                        event_name = "telegram.message_unchanged",
                        message_id = target.message_id,
                        "status message already up to date"
                    );
                    return Ok(target);
                }
                Err(error) => warn!(
                    event_name = "telegram.edit_failed",
                    message_id = target.message_id,
                    error = %error,
                    "edit failed; sending a new message"
                ),
            }
        }

        let message = OutgoingMessage::new(self.chat_id, text).keyboard(keyboard);
        let sent = self.api.send_message(&message).await.map_err(NotifyError::Send)?;
        *outstanding = Some(sent);

        debug!(
            event_name = "telegram.message_sent",
            message_id = sent.message_id,
            "status message sent"
        );
        Ok(sent)
    }

    pub async fn outstanding(&self) -> Option<MessageRef> {
        *self.outstanding.lock().await
    }
}
