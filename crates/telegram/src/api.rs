use async_trait::async_trait;
use thiserror::Error;

use crate::markup::{InlineKeyboardMarkup, OutgoingMessage};
use crate::types::{Update, User};

pub type ChatId = i64;
pub type MessageId = i64;

/// Address of a message the bot has sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("telegram request failed: {0}")]
    Http(String),
    #[error("telegram rejected {method} ({code}): {description}")]
    Rejected { method: &'static str, code: i64, description: String },
    #[error("telegram response could not be decoded: {0}")]
    Decode(String),
}

impl ApiError {
    /// Telegram refuses edits that would leave the message unchanged.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::Rejected { description, .. } if description.contains("message is not modified"))
    }
}

/// The subset of the Bot API slotwatch talks to.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageRef, ApiError>;

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), ApiError>;

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ApiError>;

    /// Long-polls for updates starting at `offset`, waiting up to `timeout_secs`.
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, ApiError>;

    async fn get_me(&self) -> Result<User, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::ApiError;

    #[test]
    fn recognizes_not_modified_rejections() {
        let error = ApiError::Rejected {
            method: "editMessageText",
            code: 400,
            description: "Bad Request: message is not modified: specified new message content and reply markup are exactly the same".to_owned(),
        };
        assert!(error.is_not_modified());

        let other = ApiError::Rejected {
            method: "editMessageText",
            code: 400,
            description: "Bad Request: message to edit not found".to_owned(),
        };
        assert!(!other.is_not_modified());
        assert!(!ApiError::Http("timeout".to_owned()).is_not_modified());
    }
}
