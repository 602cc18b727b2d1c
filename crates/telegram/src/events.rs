use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use slotwatch_core::cycle::CycleTrigger;

use crate::api::{ApiError, BotApi, ChatId, MessageId};
use crate::commands::{
    BotCommand, ACCESS_DENIED_TEXT, MY_SCHEDULE_ACK_TEXT, REFRESH_CALLBACK, UPDATE_ACK_TEXT,
    USAGE_TEXT,
};
use crate::markup::OutgoingMessage;
use crate::types::Update;

/// An update reduced to what the bot reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelegramEvent {
    Command(CommandEvent),
    Callback(CallbackEvent),
    Unsupported { update_id: i64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub command: BotCommand,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackEvent {
    pub callback_id: String,
    /// Chat of the message the button belongs to, when Telegram still has it.
    pub chat_id: Option<ChatId>,
    pub data: Option<String>,
}

impl TelegramEvent {
    pub fn from_update(update: &Update, bot_username: Option<&str>) -> Self {
        if let Some(query) = &update.callback_query {
            return Self::Callback(CallbackEvent {
                callback_id: query.id.clone(),
                chat_id: query.message.as_ref().map(|message| message.chat.id),
                data: query.data.clone(),
            });
        }

        let command = update.message.as_ref().and_then(|message| {
            let text = message.text.as_deref()?;
            let command = BotCommand::parse(text, bot_username)?;
            Some(CommandEvent { chat_id: message.chat.id, message_id: message.message_id, command })
        });

        match command {
            Some(event) => Self::Command(event),
            None => Self::Unsupported { update_id: update.update_id },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::Callback(_) => "callback",
            Self::Unsupported { .. } => "unsupported",
        }
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            Self::Command(event) => Some(event.chat_id),
            Self::Callback(event) => event.chat_id,
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// The operator's request was accepted and handed to the service.
    Accepted,
    /// Usage text was sent.
    Responded,
    /// The sender is not the operator.
    Denied,
    Ignored,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Work the bot can ask for. Implementations must return promptly; the long
/// running part belongs on a spawned task.
pub trait ScheduleCommandService: Send + Sync {
    fn request_refresh(&self, trigger: CycleTrigger);
    fn request_personal_schedule(&self, chat_id: ChatId);
}

pub struct UpdateDispatcher {
    api: Arc<dyn BotApi>,
    service: Arc<dyn ScheduleCommandService>,
    operator_chat_id: ChatId,
}

impl UpdateDispatcher {
    pub fn new(
        api: Arc<dyn BotApi>,
        service: Arc<dyn ScheduleCommandService>,
        operator_chat_id: ChatId,
    ) -> Self {
        Self { api, service, operator_chat_id }
    }

    pub async fn dispatch(&self, update: &Update) -> Result<HandlerResult, DispatchError> {
        match TelegramEvent::from_update(update, None) {
            TelegramEvent::Command(event) => self.handle_command(event).await,
            TelegramEvent::Callback(event) => self.handle_callback(event).await,
            TelegramEvent::Unsupported { .. } => Ok(HandlerResult::Ignored),
        }
    }

    fn is_operator(&self, chat_id: Option<ChatId>) -> bool {
        chat_id == Some(self.operator_chat_id)
    }

    async fn handle_command(&self, event: CommandEvent) -> Result<HandlerResult, DispatchError> {
        if matches!(event.command, BotCommand::Unknown(_)) {
            return Ok(HandlerResult::Ignored);
        }

        if !self.is_operator(Some(event.chat_id)) {
            warn!(
                event_name = "telegram.access_denied",
                chat_id = event.chat_id,
                command = event.command.as_str(),
                "command from a non-operator chat"
            );
            self.reply(&event, ACCESS_DENIED_TEXT).await?;
            return Ok(HandlerResult::Denied);
        }

        info!(
            event_name = "telegram.command_received",
            chat_id = event.chat_id,
            command = event.command.as_str(),
            "operator command"
        );

        match event.command {
            BotCommand::Update => {
                self.acknowledge(&event, UPDATE_ACK_TEXT).await;
                self.service.request_refresh(CycleTrigger::Command);
                Ok(HandlerResult::Accepted)
            }
            BotCommand::MySchedule => {
                self.acknowledge(&event, MY_SCHEDULE_ACK_TEXT).await;
                self.service.request_personal_schedule(event.chat_id);
                Ok(HandlerResult::Accepted)
            }
            BotCommand::Start | BotCommand::Help => {
                self.reply(&event, USAGE_TEXT).await?;
                Ok(HandlerResult::Responded)
            }
            BotCommand::Unknown(_) => Ok(HandlerResult::Ignored),
        }
    }

    async fn handle_callback(&self, event: CallbackEvent) -> Result<HandlerResult, DispatchError> {
        if event.data.as_deref() != Some(REFRESH_CALLBACK) {
            // Answer anyway so the client stops its spinner.
            self.api.answer_callback_query(&event.callback_id, None).await?;
            return Ok(HandlerResult::Ignored);
        }

        if !self.is_operator(event.chat_id) {
            warn!(
                event_name = "telegram.access_denied",
                chat_id = event.chat_id.unwrap_or_default(),
                command = REFRESH_CALLBACK,
                "refresh button pressed outside the operator chat"
            );
            self.api.answer_callback_query(&event.callback_id, Some(ACCESS_DENIED_TEXT)).await?;
            return Ok(HandlerResult::Denied);
        }

        if let Err(error) =
            self.api.answer_callback_query(&event.callback_id, Some(UPDATE_ACK_TEXT)).await
        {
            warn!(
                event_name = "telegram.ack_failed",
                error = %error,
                "failed to answer refresh callback"
            );
        }
        self.service.request_refresh(CycleTrigger::RefreshButton);
        Ok(HandlerResult::Accepted)
    }

    async fn reply(&self, event: &CommandEvent, text: &str) -> Result<(), ApiError> {
        let message = OutgoingMessage::new(event.chat_id, text).reply_to(event.message_id);
        self.api.send_message(&message).await.map(|_| ())
    }

    async fn acknowledge(&self, event: &CommandEvent, text: &str) {
        if let Err(error) = self.reply(event, text).await {
            warn!(
                event_name = "telegram.ack_failed",
                chat_id = event.chat_id,
                error = %error,
                "failed to acknowledge command"
            );
        }
    }
}
