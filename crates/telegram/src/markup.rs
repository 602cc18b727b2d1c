use serde::Serialize;

use crate::api::{ChatId, MessageId};
use crate::commands::REFRESH_CALLBACK;

pub const REFRESH_LABEL: &str = "🔄 Обновить";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self { text: text.into(), callback_data: data.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn single_row(buttons: Vec<InlineKeyboardButton>) -> Self {
        Self { inline_keyboard: vec![buttons] }
    }
}

/// The keyboard attached to every status message.
pub fn refresh_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::single_row(vec![InlineKeyboardButton::callback(
        REFRESH_LABEL,
        REFRESH_CALLBACK,
    )])
}

/// A Markdown message about to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub reply_to: Option<MessageId>,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl OutgoingMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self { chat_id, text: text.into(), reply_to: None, keyboard: None }
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
