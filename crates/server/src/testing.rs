//! Fakes for the server's ports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use slotwatch_core::diff::SlotSet;
use slotwatch_core::domain::booking::PersonalSchedule;
use slotwatch_core::domain::slot::{AvailabilitySnapshot, DayTimes};
use slotwatch_core::errors::SourceError;
use slotwatch_core::source::{FetchOutcome, ScheduleSource, Termination};
use slotwatch_db::{RepositoryError, SlotRepository};
use slotwatch_telegram::types::{Update, User};
use slotwatch_telegram::{ApiError, BotApi, InlineKeyboardMarkup, MessageRef, OutgoingMessage};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn snapshot(days: &[(&str, &[&str])]) -> AvailabilitySnapshot {
    days.iter()
        .map(|(date, times)| ((*date).to_owned(), DayTimes::from_labels(times.iter().copied())))
        .collect()
}

pub fn outcome(days: &[(&str, &[&str])], termination: Termination) -> FetchOutcome {
    FetchOutcome { snapshot: snapshot(days), termination }
}

/// Source that replays scripted results. With a gate, every fetch waits for
/// one permit before answering.
#[derive(Default)]
pub struct ScriptedSource {
    availability: Mutex<VecDeque<Result<FetchOutcome, SourceError>>>,
    schedule: Mutex<Option<Result<PersonalSchedule, SourceError>>>,
    gate: Option<Arc<Semaphore>>,
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(results: Vec<Result<FetchOutcome, SourceError>>) -> Self {
        Self { availability: Mutex::new(results.into()), ..Self::default() }
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_schedule(self, schedule: Result<PersonalSchedule, SourceError>) -> Self {
        *lock(&self.schedule) = Some(schedule);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleSource for ScriptedSource {
    async fn fetch_availability(&self) -> Result<FetchOutcome, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        lock(&self.availability)
            .pop_front()
            .unwrap_or_else(|| Ok(outcome(&[], Termination::Exhausted)))
    }

    async fn fetch_personal_schedule(&self) -> Result<PersonalSchedule, SourceError> {
        lock(&self.schedule).clone().unwrap_or(Ok(PersonalSchedule::NoBookings))
    }
}

/// Repository whose writes always fail.
pub struct BrokenRepository {
    pub seeded: SlotSet,
}

#[async_trait]
impl SlotRepository for BrokenRepository {
    async fn read(&self) -> Result<SlotSet, RepositoryError> {
        Ok(self.seeded.clone())
    }

    async fn replace(&self, _slots: &SlotSet) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolClosed))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent(OutgoingMessage),
    Edited(MessageRef, String),
}

#[derive(Default)]
pub struct RecordingBotApi {
    deliveries: Mutex<Vec<Delivery>>,
    next_id: AtomicUsize,
    fail_sends: Mutex<bool>,
}

impl RecordingBotApi {
    pub fn deliveries(&self) -> Vec<Delivery> {
        lock(&self.deliveries).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.deliveries()
            .into_iter()
            .map(|delivery| match delivery {
                Delivery::Sent(message) => message.text,
                Delivery::Edited(_, text) => text,
            })
            .collect()
    }

    pub fn fail_sends(&self) {
        *lock(&self.fail_sends) = true;
    }
}

#[async_trait]
impl BotApi for RecordingBotApi {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageRef, ApiError> {
        if *lock(&self.fail_sends) {
            return Err(ApiError::Http("telegram unreachable".to_owned()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.deliveries).push(Delivery::Sent(message.clone()));
        Ok(MessageRef { chat_id: message.chat_id, message_id: id as i64 })
    }

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        _keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), ApiError> {
        lock(&self.deliveries).push(Delivery::Edited(target, text.to_owned()));
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        _callback_id: &str,
        _text: Option<&str>,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn get_updates(
        &self,
        _offset: Option<i64>,
        _timeout_secs: u32,
    ) -> Result<Vec<Update>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_me(&self) -> Result<User, ApiError> {
        Err(ApiError::Http("not scripted".to_owned()))
    }
}
