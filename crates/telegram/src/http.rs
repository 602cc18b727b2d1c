//! Bot API client over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiError, BotApi, ChatId, MessageId, MessageRef};
use crate::markup::{InlineKeyboardMarkup, OutgoingMessage};
use crate::types::{ApiResponse, Message, Update, User};

const PARSE_MODE: &str = "Markdown";
const ALLOWED_UPDATES: [&str; 2] = ["message", "callback_query"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Extra time granted to `getUpdates` beyond its server-side long-poll window.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    chat_id: ChatId,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<MessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct EditMessageTextPayload<'a> {
    chat_id: ChatId,
    message_id: MessageId,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackPayload<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Serialize)]
struct GetUpdatesPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u32,
    allowed_updates: [&'static str; 2],
}

pub struct HttpBotClient {
    http: Client,
    base_url: String,
    token: SecretString,
}

impl HttpBotClient {
    pub fn new(http: Client, base_url: impl Into<String>, token: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url, token }
    }

    async fn call<P, R>(
        &self,
        method: &'static str,
        payload: &P,
        timeout: Duration,
    ) -> Result<R, ApiError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token.expose_secret());
        // Errors carry the request URL, which embeds the token.
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|error| ApiError::Http(error.without_url().to_string()))?;
        let body: ApiResponse<R> = response
            .json()
            .await
            .map_err(|error| ApiError::Decode(error.without_url().to_string()))?;
        into_result(method, body)
    }
}

fn into_result<T>(method: &'static str, response: ApiResponse<T>) -> Result<T, ApiError> {
    match response {
        ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
        ApiResponse { ok: true, result: None, .. } => {
            Err(ApiError::Decode(format!("{method} returned no result")))
        }
        ApiResponse { ok: false, error_code, description, .. } => Err(ApiError::Rejected {
            method,
            code: error_code.unwrap_or_default(),
            description: description.unwrap_or_else(|| "no description".to_owned()),
        }),
    }
}

#[async_trait]
impl BotApi for HttpBotClient {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageRef, ApiError> {
        let payload = SendMessagePayload {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: PARSE_MODE,
            reply_to_message_id: message.reply_to,
            reply_markup: message.keyboard.as_ref(),
        };
        let sent: Message = self.call("sendMessage", &payload, REQUEST_TIMEOUT).await?;
        Ok(MessageRef { chat_id: sent.chat.id, message_id: sent.message_id })
    }

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), ApiError> {
        let payload = EditMessageTextPayload {
            chat_id: target.chat_id,
            message_id: target.message_id,
            text,
            parse_mode: PARSE_MODE,
            reply_markup: keyboard,
        };
        let _: Value = self.call("editMessageText", &payload, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ApiError> {
        let payload = AnswerCallbackPayload { callback_query_id: callback_id, text };
        let _: Value = self.call("answerCallbackQuery", &payload, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, ApiError> {
        let payload = GetUpdatesPayload { offset, timeout: timeout_secs, allowed_updates: ALLOWED_UPDATES };
        let timeout = Duration::from_secs(u64::from(timeout_secs)) + POLL_GRACE;
        self.call("getUpdates", &payload, timeout).await
    }

    async fn get_me(&self) -> Result<User, ApiError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT).await
    }
}
