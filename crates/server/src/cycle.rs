use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{Local, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use slotwatch_core::cycle::{CycleEvent, CycleOutcome, CycleReport, CycleState, CycleTrigger};
use slotwatch_core::diff::SnapshotDiff;
use slotwatch_core::domain::booking::PersonalSchedule;
use slotwatch_core::errors::{DomainError, SourceError};
use slotwatch_core::render::{render_cycle_error, render_full_summary, render_new_slots_message};
use slotwatch_core::source::{ScheduleSource, Termination};
use slotwatch_db::{RepositoryError, SlotRepository};
use slotwatch_telegram::NotificationSink;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("slot store failed: {0}")]
    Store(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] DomainError),
}

/// Result of asking for a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// This caller ran the cycle, plus one rerun per burst of triggers that
    /// arrived meanwhile.
    Ran(Vec<CycleReport>),
    /// A cycle was already in flight; it will run once more when it finishes.
    Coalesced,
}

/// Shared view of the most recent cycle.
#[derive(Clone, Default)]
pub struct CycleStatus {
    latest: Arc<RwLock<Option<CycleReport>>>,
}

impl CycleStatus {
    pub fn latest(&self) -> Option<CycleReport> {
        self.latest.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn record(&self, report: CycleReport) {
        *self.latest.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(report);
    }
}

struct Completed {
    termination: Termination,
    dates_checked: usize,
    new_slots: usize,
    persisted_slots: usize,
}

/// Runs fetch → diff → persist → notify, one cycle at a time.
pub struct CycleRunner {
    source: Arc<dyn ScheduleSource>,
    repository: Arc<dyn SlotRepository>,
    sink: Arc<NotificationSink>,
    gate: Mutex<()>,
    pending: AtomicBool,
    /// Held for the life of every remote session, cycle or not.
    session: Mutex<()>,
    status: CycleStatus,
}

impl CycleRunner {
    pub fn new(
        source: Arc<dyn ScheduleSource>,
        repository: Arc<dyn SlotRepository>,
        sink: Arc<NotificationSink>,
    ) -> Self {
        Self {
            source,
            repository,
            sink,
            gate: Mutex::new(()),
            pending: AtomicBool::new(false),
            session: Mutex::new(()),
            status: CycleStatus::default(),
        }
    }

    pub fn status(&self) -> CycleStatus {
        self.status.clone()
    }

    /// Runs a cycle now, or marks one pending rerun when a cycle is already
    /// in flight. Any number of triggers during a cycle collapse into a single
    /// rerun.
    pub async fn trigger(&self, trigger: CycleTrigger) -> TriggerOutcome {
        self.pending.store(true, Ordering::SeqCst);
        self.drain_pending(trigger).await
    }

    async fn drain_pending(&self, trigger: CycleTrigger) -> TriggerOutcome {
        let mut reports = Vec::new();

        loop {
            let Ok(guard) = self.gate.try_lock() else {
                if reports.is_empty() {
                    info!(
                        event_name = "cycle.coalesced",
                        trigger = trigger.as_str(),
                        "cycle already running; rerun scheduled"
                    );
                    return TriggerOutcome::Coalesced;
                }
                break;
            };

            while self.pending.swap(false, Ordering::SeqCst) {
                reports.push(self.run_cycle(trigger).await);
            }
            drop(guard);

            // A trigger that lost the race for the gate after the loop ended
            // left its flag behind; pick it up.
            if !self.pending.load(Ordering::SeqCst) {
                break;
            }
        }

        // Another holder drained the flag before this trigger got the gate.
        if reports.is_empty() {
            return TriggerOutcome::Coalesced;
        }
        TriggerOutcome::Ran(reports)
    }

    /// Waits until no cycle is running.
    pub async fn wait_idle(&self) {
        let _guard = self.gate.lock().await;
    }

    /// Reads the operator's bookings, never overlapping a cycle's session.
    pub async fn fetch_personal_schedule(&self) -> Result<PersonalSchedule, SourceError> {
        let _session = self.session.lock().await;
        self.source.fetch_personal_schedule().await
    }

    async fn run_cycle(&self, trigger: CycleTrigger) -> CycleReport {
        let correlation_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "cycle",
            correlation_id = %correlation_id,
            trigger = trigger.as_str()
        );

        async move {
            let started_at = Utc::now();
            info!(event_name = "cycle.started", "cycle started");

            let mut state = CycleState::Idle;
            let outcome = match self.execute(&mut state).await {
                Ok(done) => {
                    info!(
                        event_name = "cycle.completed",
                        termination = done.termination.as_str(),
                        dates_checked = done.dates_checked,
                        new_slots = done.new_slots,
                        persisted_slots = done.persisted_slots,
                        "cycle completed"
                    );
                    CycleOutcome::Completed {
                        termination: done.termination,
                        dates_checked: done.dates_checked,
                        new_slots: done.new_slots,
                        persisted_slots: done.persisted_slots,
                    }
                }
                Err(failure) => {
                    let stage = state;
                    let recovered = stage.on(CycleEvent::Failed).unwrap_or(CycleState::Idle);
                    error!(
                        event_name = "cycle.failed",
                        stage = stage.as_str(),
                        next_state = recovered.as_str(),
                        error = %failure,
                        "cycle failed"
                    );
                    self.report_failure(&failure).await;
                    CycleOutcome::Failed { stage, error: failure.to_string() }
                }
            };

            let report = CycleReport {
                correlation_id,
                trigger,
                started_at,
                finished_at: Utc::now(),
                outcome,
            };
            self.status.record(report.clone());
            report
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, state: &mut CycleState) -> Result<Completed, CycleError> {
        advance(state, CycleEvent::Started)?;
        let fetched = {
            let _session = self.session.lock().await;
            self.source.fetch_availability().await?
        };
        if fetched.termination.is_truncated() {
            warn!(
                event_name = "cycle.snapshot_truncated",
                termination = fetched.termination.as_str(),
                dates_checked = fetched.snapshot.dates_checked(),
                "enumeration stopped early; keeping the partial snapshot"
            );
        }
        advance(state, CycleEvent::SnapshotFetched)?;

        let previous = self.repository.read().await?;
        let diff = SnapshotDiff::compute(&previous, &fetched.snapshot);
        advance(state, CycleEvent::DiffComputed)?;

        let checked_at = Local::now().naive_local();
        if diff.has_new_slots() {
            self.notify(&render_new_slots_message(&diff.added, &checked_at), false).await;
        }
        self.repository.replace(&diff.current).await?;
        advance(state, CycleEvent::SnapshotPersisted)?;

        // An announcement stays visible; the summary only edits an older summary.
        let summary = render_full_summary(&fetched.snapshot, &fetched.termination, &checked_at);
        self.notify(&summary, !diff.has_new_slots()).await;
        advance(state, CycleEvent::NotificationsSent)?;

        Ok(Completed {
            dates_checked: fetched.snapshot.dates_checked(),
            new_slots: diff.added.len(),
            persisted_slots: diff.current.len(),
            termination: fetched.termination,
        })
    }

    async fn notify(&self, text: &str, allow_update: bool) {
        if let Err(error) = self.sink.send_or_update(text, allow_update).await {
            warn!(
                event_name = "cycle.notification_failed",
                allow_update,
                error = %error,
                "notification failed; continuing"
            );
        }
    }

    async fn report_failure(&self, failure: &CycleError) {
        self.notify(&render_cycle_error(&failure.to_string()), false).await;
    }
}

fn advance(state: &mut CycleState, event: CycleEvent) -> Result<(), DomainError> {
    *state = state.on(event)?;
    Ok(())
}
