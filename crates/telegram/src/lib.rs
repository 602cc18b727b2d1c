//! Telegram integration - long-polling bot interface
//!
//! This crate provides the operator-facing side of slotwatch:
//! - **Bot API** (`api`, `http`) - the port and its reqwest-backed client
//! - **Commands** (`commands`) - `/update`, `/myschedule`, `/start`, `/help`
//! - **Events** (`events`) - update normalization and the operator gate
//! - **Long polling** (`runner`) - `getUpdates` loop with backoff
//! - **Notifications** (`notifier`) - send-or-edit of the single status message
//!
//! # Architecture
//!
//! ```text
//! getUpdates → UpdateDispatcher → ScheduleCommandService → CycleRunner
//!                                                              ↓
//!                               NotificationSink ← rendered message
//! ```

pub mod api;
pub mod commands;
pub mod events;
pub mod http;
pub mod markup;
pub mod notifier;
pub mod runner;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{ApiError, BotApi, ChatId, MessageId, MessageRef};
pub use commands::{BotCommand, REFRESH_CALLBACK};
pub use events::{HandlerResult, ScheduleCommandService, TelegramEvent, UpdateDispatcher};
pub use http::HttpBotClient;
pub use markup::{refresh_keyboard, InlineKeyboardMarkup, OutgoingMessage};
pub use notifier::{NotificationSink, NotifyError};
pub use runner::{LongPollRunner, ReconnectPolicy, TransportError};
