use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, BotApi};
use crate::events::{TelegramEvent, UpdateDispatcher};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("telegram poll failed: {0}")]
    Poll(#[from] ApiError),
}

/// Delay schedule between failed polls. The runner never gives up; the delay
/// only grows until `max_delay_ms`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { base_delay_ms: 250, max_delay_ms: 30_000 }
    }
}

impl ReconnectPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

pub struct LongPollRunner {
    api: Arc<dyn BotApi>,
    dispatcher: UpdateDispatcher,
    reconnect_policy: ReconnectPolicy,
    poll_timeout_secs: u32,
}

impl LongPollRunner {
    pub fn new(
        api: Arc<dyn BotApi>,
        dispatcher: UpdateDispatcher,
        reconnect_policy: ReconnectPolicy,
        poll_timeout_secs: u32,
    ) -> Self {
        Self { api, dispatcher, reconnect_policy, poll_timeout_secs }
    }

    /// Polls forever. Failures are logged and retried with backoff.
    pub async fn run(&self) {
        info!(
            event_name = "telegram.polling_started",
            poll_timeout_secs = self.poll_timeout_secs,
            "telegram long polling started"
        );

        let mut offset = None;
        let mut failures: u32 = 0;
        loop {
            match self.poll_once(&mut offset).await {
                Ok(_) => failures = 0,
                Err(error) => {
                    let delay = self.reconnect_policy.backoff(failures);
                    warn!(
                        event_name = "telegram.poll_failed",
                        attempt = failures,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %error,
                        "telegram poll failed; retrying"
                    );
                    failures = failures.saturating_add(1);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// Fetches one batch, dispatches it and advances `offset` past it.
    /// Returns the number of updates seen.
    pub async fn poll_once(&self, offset: &mut Option<i64>) -> Result<usize, TransportError> {
        let updates = self.api.get_updates(*offset, self.poll_timeout_secs).await?;

        for update in &updates {
            *offset = Some(update.update_id + 1);
            let event = TelegramEvent::from_update(update, None);

            info!(
                event_name = "telegram.update_received",
                update_id = update.update_id,
                event_type = event.kind(),
                chat_id = event.chat_id().unwrap_or_default(),
                "received telegram update"
            );

            match self.dispatcher.dispatch(update).await {
                Ok(result) => debug!(
                    event_name = "telegram.update_handled",
                    update_id = update.update_id,
                    result = ?result,
                    "update handled"
                ),
                Err(error) => warn!(
                    event_name = "telegram.dispatch_failed",
                    update_id = update.update_id,
                    error = %error,
                    "update dispatch failed; continuing poll loop"
                ),
            }
        }

        Ok(updates.len())
    }
}
