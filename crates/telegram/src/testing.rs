//! Scripted Bot API used by the crate's tests.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiError, BotApi, MessageRef};
use crate::markup::{InlineKeyboardMarkup, OutgoingMessage};
use crate::types::{CallbackQuery, Chat, Message, Update, User};

#[derive(Clone, Debug, Default)]
pub struct Recorded {
    pub sent: Vec<OutgoingMessage>,
    pub edits: Vec<(MessageRef, String)>,
    pub answers: Vec<(String, Option<String>)>,
    pub polls: Vec<Option<i64>>,
}

#[derive(Default)]
struct Script {
    recorded: Recorded,
    next_message_id: i64,
    edit_errors: VecDeque<ApiError>,
    send_errors: VecDeque<ApiError>,
    updates: VecDeque<Result<Vec<Update>, ApiError>>,
}

#[derive(Default)]
pub struct ScriptedBotApi {
    script: Mutex<Script>,
}

impl ScriptedBotApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_edit(&self, error: ApiError) {
        self.lock().edit_errors.push_back(error);
    }

    pub fn fail_next_send(&self, error: ApiError) {
        self.lock().send_errors.push_back(error);
    }

    pub fn push_updates(&self, batch: Result<Vec<Update>, ApiError>) {
        self.lock().updates.push_back(batch);
    }

    pub fn recorded(&self) -> Recorded {
        self.lock().recorded.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BotApi for ScriptedBotApi {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageRef, ApiError> {
        let mut script = self.lock();
        if let Some(error) = script.send_errors.pop_front() {
            return Err(error);
        }
        script.next_message_id += 1;
        script.recorded.sent.push(message.clone());
        Ok(MessageRef { chat_id: message.chat_id, message_id: script.next_message_id })
    }

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        _keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), ApiError> {
        let mut script = self.lock();
        if let Some(error) = script.edit_errors.pop_front() {
            return Err(error);
        }
        script.recorded.edits.push((target, text.to_owned()));
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ApiError> {
        self.lock().recorded.answers.push((callback_id.to_owned(), text.map(str::to_owned)));
        Ok(())
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        _timeout_secs: u32,
    ) -> Result<Vec<Update>, ApiError> {
        let next = {
            let mut script = self.lock();
            script.recorded.polls.push(offset);
            script.updates.pop_front()
        };
        match next {
            Some(batch) => batch,
            None => {
                // An idle long poll.
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn get_me(&self) -> Result<User, ApiError> {
        Ok(user(1, Some("SlotWatchBot")))
    }
}

pub fn user(id: i64, username: Option<&str>) -> User {
    User {
        id,
        is_bot: false,
        first_name: "Test".to_owned(),
        username: username.map(str::to_owned),
    }
}

pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id * 10,
            chat: Chat { id: chat_id },
            from: Some(user(chat_id, None)),
            text: Some(text.to_owned()),
        }),
        callback_query: None,
    }
}

pub fn callback_update(update_id: i64, chat_id: i64, data: &str) -> Update {
    Update {
        update_id,
        message: None,
        callback_query: Some(CallbackQuery {
            id: format!("cb-{update_id}"),
            from: user(chat_id, None),
            message: Some(Message {
                message_id: 1,
                chat: Chat { id: chat_id },
                from: None,
                text: None,
            }),
            data: Some(data.to_owned()),
        }),
    }
}
