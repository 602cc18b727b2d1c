use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use slotwatch_core::cycle::CycleTrigger;
use slotwatch_core::render::{render_personal_schedule, render_personal_schedule_error};
use slotwatch_telegram::{BotApi, ChatId, OutgoingMessage, ScheduleCommandService};

use crate::cycle::{CycleRunner, TriggerOutcome};

/// Bridges bot commands to the cycle runner. Every request is spawned so the
/// poll loop never waits on a browser session.
pub struct BotCommandService {
    runner: Arc<CycleRunner>,
    api: Arc<dyn BotApi>,
}

impl BotCommandService {
    pub fn new(runner: Arc<CycleRunner>, api: Arc<dyn BotApi>) -> Self {
        Self { runner, api }
    }
}

impl ScheduleCommandService for BotCommandService {
    fn request_refresh(&self, trigger: CycleTrigger) {
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            if let TriggerOutcome::Ran(reports) = runner.trigger(trigger).await {
                info!(
                    event_name = "cycle.trigger_finished",
                    trigger = trigger.as_str(),
                    cycles = reports.len(),
                    "requested refresh finished"
                );
            }
        });
    }

    fn request_personal_schedule(&self, chat_id: ChatId) {
        let runner = Arc::clone(&self.runner);
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let text = match runner.fetch_personal_schedule().await {
                Ok(schedule) => render_personal_schedule(&schedule, &Local::now().naive_local()),
                Err(error) => {
                    warn!(
                        event_name = "schedule.personal_fetch_failed",
                        error = %error,
                        "personal schedule fetch failed"
                    );
                    render_personal_schedule_error(&error.to_string())
                }
            };

            if let Err(error) = api.send_message(&OutgoingMessage::new(chat_id, text)).await {
                warn!(
                    event_name = "schedule.personal_reply_failed",
                    chat_id,
                    error = %error,
                    "failed to send personal schedule"
                );
            }
        });
    }
}
